//! CLI commands

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use marquee_api::jwt::decode_claims;
use marquee_api::types::{Media, MediaQuery, MediaType, SubscriptionPlan};
use marquee_api::StreamingClient;
use marquee_core::carousel::Carousel;
use marquee_core::config::AppConfig;
use marquee_core::plans::{self, PLANS};
use marquee_runtime::{Runtime, RuntimeError, SubscribeOutcome};

use crate::format;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and keep the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the session token
    Logout,

    /// Show whether the stored session is still usable
    Status,

    /// Show the signed-in user's profile
    Whoami,

    /// List the titles featured in the banner
    Banners,

    /// Show the home screen's genre rows
    Home {
        /// Only titles released this year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Browse the catalog
    Browse {
        /// Movie or Series
        #[arg(long = "type")]
        media_type: Option<String>,
        /// Genre id
        #[arg(long)]
        genre: Option<u32>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// Search titles by name
    Search {
        title: String,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show details for one title
    Show { id: u32 },

    /// List actors
    Actors,

    /// List your favorites
    Favorites,

    /// Add or remove a title from your favorites
    Favorite { id: u32 },

    /// Titles picked for you
    Recommend,

    /// List subscription plans
    Plans,

    /// Switch to a subscription plan (free, premium, vip)
    Subscribe { plan: String },

    /// Change your password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },

    /// Get the stream URL for a title
    Watch {
        id: u32,
        /// Record the playback position, in seconds
        #[arg(long)]
        at: Option<u32>,
    },

    /// Titles you started watching
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Remove a title from your watch history
    Forget { id: u32 },

    /// Walk through the banner carousel as it auto-advances
    Carousel {
        /// Number of auto-advance intervals to simulate
        #[arg(long, default_value_t = 5)]
        ticks: u32,
    },

    /// Show the active settings
    Config {
        /// Save this backend URL to the config file
        #[arg(long, value_name = "URL")]
        set_api: Option<String>,
    },
}

impl Commands {
    pub async fn execute(self, rt: &Runtime) -> Result<()> {
        match self {
            Commands::Login { username, password } => login(rt, &username, &password).await,
            Commands::Register {
                username,
                email,
                password,
            } => {
                let user = rt.register(&username, &email, &password).await?;
                println!("Account created for {}. You can log in now.", user.username);
                Ok(())
            }
            Commands::Logout => {
                rt.logout().await?;
                println!("Logged out.");
                Ok(())
            }
            Commands::Status => status(rt).await,
            Commands::Whoami => whoami(rt).await,
            Commands::Banners => {
                let banners = rt.banners().await;
                if banners.is_empty() {
                    println!("No featured titles right now.");
                }
                print_media(&banners);
                Ok(())
            }
            Commands::Home { year } => {
                for row in rt.genre_rows(year).await {
                    println!("{} ({})", row.name, row.media.len());
                    for media in &row.media {
                        println!("  {}", format::media_line(media));
                    }
                }
                Ok(())
            }
            Commands::Browse {
                media_type,
                genre,
                page,
                size,
            } => {
                let query = MediaQuery {
                    page,
                    size,
                    media_type: media_type.as_deref().map(MediaType::parse),
                    genre_id: genre,
                    ..Default::default()
                };
                let result = rt.browse(&query).await?;
                print_media(&result.content);
                println!(
                    "page {} of {} ({} titles)",
                    result.page + 1,
                    result.total_pages.max(1),
                    result.total_elements
                );
                if result.has_next() {
                    println!("more with --page {}", result.page + 1);
                }
                Ok(())
            }
            Commands::Search { title, year } => {
                let query = MediaQuery {
                    release_year: year,
                    ..MediaQuery::title(title)
                };
                let result = rt.search(&query).await?;
                if result.content.is_empty() {
                    println!("No matches.");
                }
                print_media(&result.content);
                Ok(())
            }
            Commands::Show { id } => show(rt, id).await,
            Commands::Actors => {
                for actor in rt.actors().await? {
                    println!("#{:<4} {}", actor.actor_id, actor.actor_name);
                }
                Ok(())
            }
            Commands::Favorites => {
                let favorites = rt.favorites().await.map_err(login_hint)?;
                if favorites.is_empty() {
                    println!("No favorites yet.");
                }
                print_media(&favorites);
                Ok(())
            }
            Commands::Favorite { id } => {
                let now_favorite = rt.toggle_favorite(id).await.map_err(login_hint)?;
                if now_favorite {
                    println!("Added #{id} to favorites.");
                } else {
                    println!("Removed #{id} from favorites.");
                }
                Ok(())
            }
            Commands::Recommend => {
                print_media(&rt.recommendations().await.map_err(login_hint)?);
                Ok(())
            }
            Commands::Plans => {
                print_plans();
                Ok(())
            }
            Commands::Subscribe { plan } => subscribe(rt, &plan).await,
            Commands::Password { current, new } => {
                rt.change_password(&current, &new)
                    .await
                    .map_err(login_hint)?;
                println!("Password changed.");
                Ok(())
            }
            Commands::Watch { id, at } => {
                let link = rt.stream(id).await.map_err(login_hint)?;
                println!("{}", link.url);
                if let Some(position) = at {
                    let entry = rt.update_progress(id, position).await?;
                    if let Some(pct) = entry.progress_percent() {
                        println!("{}", format::progress_bar(pct, 20));
                    }
                }
                Ok(())
            }
            Commands::History { limit } => history(rt, limit).await,
            Commands::Forget { id } => {
                if rt.forget(id).await? {
                    println!("Removed #{id} from history.");
                } else {
                    println!("#{id} was not in your history.");
                }
                Ok(())
            }
            Commands::Carousel { ticks } => carousel(rt, ticks).await,
            Commands::Config { set_api } => config(rt, set_api).await,
        }
    }
}

fn login_hint(e: RuntimeError) -> anyhow::Error {
    match e {
        RuntimeError::NotAuthenticated => {
            anyhow::anyhow!("not logged in; run `marquee login -u <name> -p <password>`")
        }
        other => other.into(),
    }
}

fn print_media(list: &[Media]) {
    for media in list {
        println!("{}", format::media_line(media));
    }
}

async fn login(rt: &Runtime, username: &str, password: &str) -> Result<()> {
    let session = rt.login(username, password).await?;
    match session.user {
        Some(user) => println!("Logged in as {} ({} plan).", user.username, user.plan()),
        None => println!("Logged in."),
    }

    if let Some(plan) = rt.pending_subscription().await? {
        info!(plan = plan.id(), "resuming plan choice from before login");
        println!("Picking up where you left off: subscribing to {plan}.");
        report_subscription(rt.subscribe(plan).await?, plan);
    }
    Ok(())
}

async fn status(rt: &Runtime) -> Result<()> {
    if !rt.session().await.has_token() {
        println!("Not logged in.");
        return Ok(());
    }

    match rt.introspect().await {
        Ok(valid) => {
            let claims = rt
                .session()
                .await
                .token
                .as_deref()
                .and_then(|t| decode_claims(t).ok());
            if valid {
                print!("Logged in");
                if claims.as_ref().is_some_and(|c| c.has_scope("ADMIN")) {
                    print!(" as administrator");
                }
                let expires = claims
                    .and_then(|c| c.exp)
                    .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0));
                if let Some(exp) = expires {
                    print!(", token valid until {}", exp.format("%Y-%m-%d %H:%M UTC"));
                }
                println!(".");
            } else {
                println!("The server no longer accepts this session. Log in again.");
            }
        }
        Err(RuntimeError::NotAuthenticated) => {
            println!("Session expired. Log in again.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn whoami(rt: &Runtime) -> Result<()> {
    let user = rt.profile().await.map_err(login_hint)?;
    println!("{} (#{})", user.username, user.user_id);
    if let Some(ref email) = user.email {
        println!("  email:  {email}");
    }
    print!("  plan:   {}", user.plan());
    match user.subscription_expiry {
        Some(expiry) => println!(" (until {expiry})"),
        None => println!(),
    }
    if let Some(status) = user.account_status {
        println!("  status: {status:?}");
    }
    if let Some(joined) = user.join_date {
        println!("  joined: {}", joined.format("%Y-%m-%d"));
    }
    Ok(())
}

async fn show(rt: &Runtime, id: u32) -> Result<()> {
    let media = rt.media(id).await?;
    println!("{}", format::media_line(&media));
    if let Some(minutes) = media.duration {
        println!("  runtime:  {}", format::runtime(minutes));
    }
    if let Some(ref rating) = media.age_rating {
        println!("  rating:   {rating}");
    }
    if let Some(ref language) = media.language {
        println!("  language: {language}");
    }
    if !media.directors.is_empty() {
        let names: Vec<&str> = media
            .directors
            .iter()
            .map(|d| d.director_name.as_str())
            .collect();
        println!("  director: {}", names.join(", "));
    }
    if !media.actors.is_empty() {
        let names: Vec<&str> = media.actors.iter().map(|a| a.actor_name.as_str()).collect();
        println!("  cast:     {}", names.join(", "));
    }
    if let Some(ref description) = media.description {
        println!();
        println!("{description}");
    }
    if media.is_series() {
        for season in media.episodes_sorted() {
            println!();
            println!("Season {}", season.season_number);
            for episode in &season.episodes {
                println!(
                    "  {:>2}. {}",
                    episode.episode_number,
                    episode.title.as_deref().unwrap_or("Untitled")
                );
            }
        }
    }
    Ok(())
}

fn print_plans() {
    for plan in PLANS {
        let badge = if plan.popular { "  ★ most popular" } else { "" };
        let price = if plan.is_free() { "free" } else { plan.price };
        println!("{} ({}) {price}{badge}", plan.name(), plan.id());
        println!("  {}", plan.tagline);
        for feature in plan.features {
            println!("  ✓ {feature}");
        }
        println!();
    }
}

async fn subscribe(rt: &Runtime, id: &str) -> Result<()> {
    let Some(info) = plans::find(id) else {
        bail!("unknown plan '{id}' (choose free, premium or vip)");
    };
    match rt.subscribe(info.plan).await {
        Ok(outcome) => {
            report_subscription(outcome, info.plan);
            Ok(())
        }
        Err(RuntimeError::NotAuthenticated) => {
            println!(
                "Log in to subscribe to {}. Your choice is saved and will be applied after login.",
                info.name()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn report_subscription(outcome: SubscribeOutcome, plan: SubscriptionPlan) {
    match outcome {
        SubscribeOutcome::AlreadyFree => println!("You are on the Free plan."),
        SubscribeOutcome::Updated(user) => {
            println!("Subscribed to {plan}.");
            if let Some(expiry) = user.subscription_expiry {
                println!("Renews on {expiry}.");
            }
        }
    }
}

async fn history(rt: &Runtime, limit: usize) -> Result<()> {
    let entries = rt.keep_watching(limit).await?;
    if entries.is_empty() {
        println!("Nothing watched yet.");
    }
    for entry in entries {
        let progress = entry
            .progress_percent()
            .map(|pct| format::progress_bar(pct, 20))
            .unwrap_or_default();
        println!(
            "#{:<4} {:<32} {progress} {}",
            entry.media_id,
            entry.title,
            format::relative_time(&entry.watched_at)
        );
    }
    Ok(())
}

async fn carousel(rt: &Runtime, ticks: u32) -> Result<()> {
    let config = rt.config().await.carousel;
    let banners = rt.banners().await;
    if banners.is_empty() {
        println!("No featured titles right now.");
        return Ok(());
    }

    let interval = Duration::from_secs(config.auto_advance_secs);
    let mut carousel = Carousel::new(banners, &config);
    for step in 0..=ticks {
        let media = carousel
            .current()
            .context("carousel lost its current slide")?;
        println!(
            "[{:>3}s] {}  {}",
            u64::from(step) * interval.as_secs(),
            format::dots(carousel.dots().len(), carousel.index()),
            format::media_line(media)
        );
        if step < ticks && carousel.tick(interval) == 0 {
            println!("Auto-advance is disabled.");
            break;
        }
    }
    Ok(())
}

async fn config(rt: &Runtime, set_api: Option<String>) -> Result<()> {
    if let Some(url) = set_api {
        let config = rt.config().await;
        StreamingClient::new(url.as_str(), config.api.timeout())
            .with_context(|| format!("invalid backend URL '{url}'"))?;

        let mut saved = AppConfig::load().context("failed to load config")?;
        saved.api.base_url = url;
        saved.save().context("failed to save config")?;
        info!(api = %saved.api.base_url, "backend URL saved");
        println!("Saved. Future commands use {}.", saved.api.base_url);
        return Ok(());
    }

    let config = rt.config().await;
    let settings = [
        ("api.base_url", config.api.base_url.clone()),
        ("api.timeout_secs", config.api.timeout_secs.to_string()),
        ("session.refreshable_secs", config.session.refreshable_secs.to_string()),
        ("session.leeway_secs", config.session.leeway_secs.to_string()),
        ("carousel.auto_advance_secs", config.carousel.auto_advance_secs.to_string()),
        ("carousel.drag_threshold", config.carousel.drag_threshold.to_string()),
        ("carousel.max_dots", config.carousel.max_dots.to_string()),
    ];
    for (key, value) in settings {
        println!("{key:<28}{value}");
    }
    Ok(())
}
