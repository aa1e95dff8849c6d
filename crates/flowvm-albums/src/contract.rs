//! Contract of the album search screen: intents, state, mutations, effects
//! and navigation events.

use std::fmt;

use crate::entity::{Album, AlbumSummary, SearchAlbums};

// =============================================================================
// Intents
// =============================================================================

/// Requests the search screen understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchIntent {
    /// Search albums for `query`. Newer queries supersede older ones.
    Search { query: String },

    /// The user picked a search hit.
    ClickAlbum { album: AlbumSummary },

    /// Load the detail behind `link`.
    ShowAlbum { link: String },
}

// =============================================================================
// State
// =============================================================================

/// Snapshot rendered by the search and album screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Query of the most recent search.
    pub query: String,

    /// Results of the most recent successful search. `None` before the first
    /// search or after a blank query.
    pub search: Option<SearchAlbums>,

    /// Most recently loaded album detail.
    pub album: Option<Album>,

    /// A search is in flight.
    pub loading: bool,
}

impl SearchState {
    /// Hits of the current results, empty when there are none.
    pub fn albums(&self) -> &[AlbumSummary] {
        self.search.as_ref().map(|s| s.albums()).unwrap_or_default()
    }
}

/// State actions of the search screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMutation {
    /// A search for `query` started.
    Loading { query: String },

    /// Results arrived.
    SearchLoaded(SearchAlbums),

    /// The search failed; results stay as they were.
    SearchFailed,

    /// Blank query: no results to show.
    Cleared,

    /// Album detail arrived.
    AlbumLoaded(Album),
}

impl SearchMutation {
    /// Fold this mutation into `state`.
    pub fn apply(self, state: &SearchState) -> SearchState {
        match self {
            SearchMutation::Loading { query } => SearchState {
                query,
                loading: true,
                ..state.clone()
            },
            SearchMutation::SearchLoaded(search) => SearchState {
                search: Some(search),
                loading: false,
                ..state.clone()
            },
            SearchMutation::SearchFailed => SearchState {
                loading: false,
                ..state.clone()
            },
            SearchMutation::Cleared => SearchState {
                query: String::new(),
                search: None,
                loading: false,
                ..state.clone()
            },
            SearchMutation::AlbumLoaded(album) => SearchState {
                album: Some(album),
                ..state.clone()
            },
        }
    }
}

// =============================================================================
// Effects & Events
// =============================================================================

/// One-shot feedback for the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    Toast(String),
}

/// Navigation destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Search,
    Album { link: String },
}

impl Screen {
    /// Route pattern of the album screen.
    pub const ALBUM_ROUTE: &'static str = "album?link={link}";

    /// Navigation argument carrying the album link.
    pub const LINK: &'static str = "link";

    /// Concrete route for this screen.
    pub fn route(&self) -> String {
        match self {
            Screen::Search => "search".to_string(),
            Screen::Album { link } => Self::ALBUM_ROUTE.replace("{link}", link),
        }
    }

    /// Parse a concrete route back into a screen.
    pub fn from_route(route: &str) -> Option<Self> {
        if route == "search" {
            return Some(Screen::Search);
        }
        let link = route.strip_prefix("album?")?.strip_prefix(Self::LINK)?;
        let link = link.strip_prefix('=')?;
        Some(Screen::Album {
            link: link.to_string(),
        })
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route())
    }
}

/// Imperative events of the search screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Navigate(Screen),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kuuki_results() -> SearchAlbums {
        SearchAlbums::new(vec![
            AlbumSummary::new("album/1001", "Kuuki Album A"),
            AlbumSummary::new("album/1002", "Kuuki Album B"),
        ])
    }

    #[test]
    fn test_search_sequence_folds_to_loaded() {
        let initial = SearchState::default();
        let loading = SearchMutation::Loading {
            query: "kuuki".to_string(),
        }
        .apply(&initial);
        assert!(loading.loading);
        assert_eq!(loading.query, "kuuki");
        assert!(loading.search.is_none());

        let loaded = SearchMutation::SearchLoaded(kuuki_results()).apply(&loading);
        assert!(!loaded.loading);
        assert_eq!(loaded.albums().len(), 2);
    }

    #[test]
    fn test_failed_search_keeps_results() {
        let state = SearchState {
            query: "kuuki".to_string(),
            search: Some(kuuki_results()),
            album: None,
            loading: false,
        };
        let loading = SearchMutation::Loading {
            query: "z".to_string(),
        }
        .apply(&state);
        let failed = SearchMutation::SearchFailed.apply(&loading);

        assert!(!failed.loading);
        assert_eq!(failed.search, state.search);
    }

    #[test]
    fn test_cleared_drops_results_keeps_album() {
        let album = Album {
            name: "Kuuki Album A".to_string(),
            covers: Vec::new(),
        };
        let state = SearchState {
            query: "kuuki".to_string(),
            search: Some(kuuki_results()),
            album: Some(album.clone()),
            loading: true,
        };
        let cleared = SearchMutation::Cleared.apply(&state);
        assert!(cleared.search.is_none());
        assert!(cleared.albums().is_empty());
        assert_eq!(cleared.album, Some(album));
        assert!(!cleared.loading);
    }

    #[test]
    fn test_screen_routes() {
        let screen = Screen::Album {
            link: "album/79".to_string(),
        };
        assert_eq!(screen.route(), "album?link=album/79");
        assert_eq!(Screen::from_route("album?link=album/79"), Some(screen));
        assert_eq!(Screen::from_route("search"), Some(Screen::Search));
        assert_eq!(Screen::from_route("settings"), None);
        assert_eq!(Screen::Search.to_string(), "search");
    }
}
