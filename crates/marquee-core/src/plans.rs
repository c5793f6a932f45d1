use marquee_api::types::SubscriptionPlan;

/// A purchasable tier as presented to the user.
#[derive(Debug, Clone, Copy)]
pub struct PlanInfo {
    pub plan: SubscriptionPlan,
    pub price: &'static str,
    pub tagline: &'static str,
    pub popular: bool,
    pub features: &'static [&'static str],
}

impl PlanInfo {
    pub fn id(&self) -> &'static str {
        self.plan.id()
    }

    pub fn name(&self) -> &'static str {
        self.plan.as_str()
    }

    pub fn is_free(&self) -> bool {
        self.plan == SubscriptionPlan::Free
    }
}

pub const PLANS: &[PlanInfo] = &[
    PlanInfo {
        plan: SubscriptionPlan::Free,
        price: "0 $/month",
        tagline: "Basic experience for beginners",
        popular: false,
        features: &[
            "Limited content access",
            "SD video quality",
            "With advertisements",
            "1 device can stream simultaneously",
            "Basic support",
        ],
    },
    PlanInfo {
        plan: SubscriptionPlan::Premium,
        price: "99.000 $/month",
        tagline: "Most popular choice for families",
        popular: true,
        features: &[
            "All movies and shows",
            "Full HD video quality",
            "No ads",
            "2 devices simultaneously",
            "Priority support",
            "Download to watch offline",
        ],
    },
    PlanInfo {
        plan: SubscriptionPlan::Vip,
        price: "199.000 $/month",
        tagline: "Ultimate premium experience",
        popular: false,
        features: &[
            "All exclusive content",
            "4K + HDR video quality",
            "No ads",
            "4 devices simultaneously",
            "24/7 VIP support",
            "Unlimited downloads",
            "Early access to new releases",
        ],
    },
];

/// Look a plan up by its id (`free`, `premium`, `vip`), ignoring case.
pub fn find(id: &str) -> Option<&'static PlanInfo> {
    let plan = SubscriptionPlan::from_id(id.trim())?;
    info(plan)
}

pub fn info(plan: SubscriptionPlan) -> Option<&'static PlanInfo> {
    PLANS.iter().find(|p| p.plan == plan)
}
