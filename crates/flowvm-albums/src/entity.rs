//! Album and search result entities.
//!
//! Field names follow the VGMdb JSON shapes so fixtures can be reused as-is.

use serde::{Deserialize, Serialize};

/// Response of an album search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAlbums {
    pub results: SearchResults,
}

impl SearchAlbums {
    pub fn new(albums: Vec<AlbumSummary>) -> Self {
        Self {
            results: SearchResults { albums },
        }
    }

    pub fn albums(&self) -> &[AlbumSummary] {
        &self.results.albums
    }

    pub fn is_empty(&self) -> bool {
        self.results.albums.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub albums: Vec<AlbumSummary>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    /// Path of the album detail, e.g. `album/79`.
    pub link: String,
    pub titles: Titles,
}

impl AlbumSummary {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            titles: Titles { ja: title.into() },
        }
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.titles.ja
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    pub ja: String,
}

/// Album detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub covers: Vec<Cover>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub thumb: String,
}
