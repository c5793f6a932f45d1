use marquee_api::types::MediaQuery;

/// A genre row on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeCategory {
    pub name: &'static str,
    pub genre_id: u32,
}

/// Rows shown on the home screen, in display order.
pub const HOME_CATEGORIES: &[HomeCategory] = &[
    HomeCategory {
        name: "Comedy",
        genre_id: 4,
    },
    HomeCategory {
        name: "Action",
        genre_id: 1,
    },
    HomeCategory {
        name: "Family",
        genre_id: 8,
    },
];

impl HomeCategory {
    /// Search query for this row, optionally limited to one release year.
    pub fn query(&self, release_year: Option<i32>) -> MediaQuery {
        MediaQuery::genre(self.genre_id, release_year)
    }
}
