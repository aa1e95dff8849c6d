//! The album search screen model.
//!
//! ## Lanes
//!
//! | Intent        | Lane          | Policy |
//! |---------------|---------------|--------|
//! | `Search`      | `search`      | Latest |
//! | `ClickAlbum`  | `click_album` | Concat |
//! | `ShowAlbum`   | `show_album`  | Concat |
//!
//! Empty search results are shown through state only; failures surface as a
//! toast.

use std::sync::Arc;

use flowvm_core::{
    distinct_until_changed, ContainerBuilder, Emitter, HandlerError, HandlerResult, Model, Route,
    StateContainer,
};
use futures::future::{self, BoxFuture};
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::contract::{NavEvent, Screen, SearchIntent, SearchMutation, SearchState, ViewEffect};
use crate::entity::{Album, AlbumSummary};
use crate::error::ScreenError;
use crate::service::AlbumService;

pub const SEARCH_LANE: &str = "search";
pub const CLICK_ALBUM_LANE: &str = "click_album";
pub const SHOW_ALBUM_LANE: &str = "show_album";

// =============================================================================
// AlbumScreen
// =============================================================================

/// Model of the album search screen.
pub struct AlbumScreen {
    service: Arc<dyn AlbumService>,
}

impl AlbumScreen {
    pub fn new(service: Arc<dyn AlbumService>) -> Self {
        Self { service }
    }

    /// Builder for a container running this screen from the empty state.
    pub fn container(self) -> ContainerBuilder<Self> {
        StateContainer::builder(Arc::new(self), SearchState::default())
    }
}

impl Model for AlbumScreen {
    type Intent = SearchIntent;
    type State = SearchState;
    type Mutation = SearchMutation;
    type Effect = ViewEffect;
    type Event = NavEvent;

    fn route(&self, intent: &SearchIntent) -> Route {
        match intent {
            SearchIntent::Search { .. } => Route::latest(SEARCH_LANE),
            SearchIntent::ClickAlbum { .. } => Route::concat(CLICK_ALBUM_LANE),
            SearchIntent::ShowAlbum { .. } => Route::concat(SHOW_ALBUM_LANE),
        }
    }

    fn handle(
        &self,
        intent: SearchIntent,
        emitter: Emitter<Self>,
    ) -> BoxFuture<'static, HandlerResult> {
        let service = self.service.clone();

        match intent {
            SearchIntent::Search { query } => Box::pin(search(service, query, emitter)),
            SearchIntent::ClickAlbum { album } => Box::pin(click_album(album, emitter)),
            SearchIntent::ShowAlbum { link } => Box::pin(show_album(service, link, emitter)),
        }
    }

    fn reduce(state: &SearchState, mutation: SearchMutation) -> SearchState {
        mutation.apply(state)
    }

    fn recover(&self, lane: &'static str, error: &HandlerError) -> Option<ViewEffect> {
        match error {
            HandlerError::Failed(source) => {
                tracing::debug!(lane, "Surfacing failure as toast");
                Some(ViewEffect::Toast(source.to_string()))
            }
            HandlerError::Cancelled => None,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn search(
    service: Arc<dyn AlbumService>,
    query: String,
    emitter: Emitter<AlbumScreen>,
) -> HandlerResult {
    if query.trim().is_empty() {
        return emitter.set_state(SearchMutation::Cleared).await;
    }

    emitter
        .set_state(SearchMutation::Loading {
            query: query.clone(),
        })
        .await?;

    match service.search_albums(&query).await {
        Ok(results) => {
            tracing::debug!("Search {:?}: {} album(s)", query, results.albums().len());
            emitter
                .set_state(SearchMutation::SearchLoaded(results))
                .await
        }
        Err(source) => {
            emitter.set_state(SearchMutation::SearchFailed).await?;
            Err(HandlerError::failed(ScreenError::Search { query, source }))
        }
    }
}

async fn click_album(album: AlbumSummary, emitter: Emitter<AlbumScreen>) -> HandlerResult {
    let screen = Screen::Album { link: album.link };
    emitter.event(NavEvent::Navigate(screen)).await
}

async fn show_album(
    service: Arc<dyn AlbumService>,
    link: String,
    emitter: Emitter<AlbumScreen>,
) -> HandlerResult {
    match service.album(&link).await {
        Ok(album) => emitter.set_state(SearchMutation::AlbumLoaded(album)).await,
        Err(source) => Err(HandlerError::failed(ScreenError::Album { link, source })),
    }
}

// =============================================================================
// Derived Streams
// =============================================================================

/// Hits of the current results, re-emitted when the results change.
/// Nothing is emitted until a first search produced results.
pub fn album_results(
    container: &StateContainer<AlbumScreen>,
) -> BoxStream<'static, Vec<AlbumSummary>> {
    container
        .observe_slice(|state| state.search.map(|s| s.results.albums))
        .filter_map(future::ready)
        .boxed()
}

/// The loaded album detail, re-emitted when it changes.
pub fn album_detail(container: &StateContainer<AlbumScreen>) -> BoxStream<'static, Option<Album>> {
    container.observe_slice(|state| state.album)
}

/// Wait until `query` has been processed: results or a failure for a
/// non-blank query, the cleared state for a blank one.
///
/// Returns `None` if the container terminates first.
pub async fn query_settled(
    container: &StateContainer<AlbumScreen>,
    query: &str,
) -> Option<SearchState> {
    let expected = if query.trim().is_empty() { "" } else { query };
    // The initial state also has a blank query and no loading flag
    container
        .wait_for(|s| container.transitions() > 0 && s.query == expected && !s.loading)
        .await
}

/// Turn a text-input stream into search intents, skipping repeated text.
pub fn query_intents<S>(text: S) -> impl Stream<Item = SearchIntent> + Send + 'static
where
    S: Stream<Item = String> + Send + 'static,
{
    distinct_until_changed(text).map(|query| SearchIntent::Search { query })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SearchAlbums;
    use crate::error::ServiceError;
    use crate::service::MockAlbumService;
    use std::time::Duration;
    use tokio::time::timeout;

    fn kuuki() -> SearchAlbums {
        SearchAlbums::new(vec![
            AlbumSummary::new("album/1001", "Album A"),
            AlbumSummary::new("album/1002", "Album B"),
        ])
    }

    fn spawn(mock: MockAlbumService) -> StateContainer<AlbumScreen> {
        AlbumScreen::new(Arc::new(mock)).container().spawn()
    }

    #[test]
    fn test_routes() {
        let screen = AlbumScreen::new(Arc::new(MockAlbumService::new()));
        let search = screen.route(&SearchIntent::Search {
            query: "x".to_string(),
        });
        assert_eq!(search, Route::latest(SEARCH_LANE));

        let show = screen.route(&SearchIntent::ShowAlbum {
            link: "album/1".to_string(),
        });
        assert_eq!(show, Route::concat(SHOW_ALBUM_LANE));
    }

    #[tokio::test]
    async fn test_search_loads_results() {
        let mut mock = MockAlbumService::new();
        mock.expect_search_albums()
            .withf(|q| q == "kuuki")
            .times(1)
            .returning(|_| Ok(kuuki()));

        let container = spawn(mock);
        container
            .submit(SearchIntent::Search {
                query: "kuuki".to_string(),
            })
            .unwrap();

        let state = timeout(
            Duration::from_secs(5),
            container.wait_for(|s| s.search.is_some()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(state.albums().len(), 2);
        assert_eq!(state.query, "kuuki");
        assert!(!state.loading);
        // Loading, then loaded
        assert_eq!(container.transitions(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_skips_service() {
        let mut mock = MockAlbumService::new();
        mock.expect_search_albums().never();

        let container = spawn(mock);
        container
            .submit(SearchIntent::Search {
                query: "   ".to_string(),
            })
            .unwrap();

        timeout(
            Duration::from_secs(5),
            container.wait_for(|_| container.transitions() == 1),
        )
        .await
        .unwrap()
        .unwrap();
        let state = container.current_state();
        assert!(state.search.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_empty_results_do_not_toast() {
        let mut mock = MockAlbumService::new();
        mock.expect_search_albums()
            .returning(|_| Ok(SearchAlbums::default()));

        let container = spawn(mock);
        let mut effects = container.observe_effects();
        container
            .submit(SearchIntent::Search {
                query: "nothing".to_string(),
            })
            .unwrap();

        let state = timeout(
            Duration::from_secs(5),
            container.wait_for(|s| s.search.is_some()),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(state.albums().is_empty());
        assert!(timeout(Duration::from_millis(50), effects.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_failure_toasts_once() {
        let mut mock = MockAlbumService::new();
        mock.expect_search_albums()
            .returning(|_| Err(ServiceError::Unavailable("offline".to_string())));

        let container = spawn(mock);
        let mut effects = container.observe_effects();
        container
            .submit(SearchIntent::Search {
                query: "z".to_string(),
            })
            .unwrap();

        let effect = timeout(Duration::from_secs(5), effects.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            effect,
            ViewEffect::Toast("search failed for query: z".to_string())
        );

        let state = container.current_state();
        assert!(!state.loading);
        assert!(state.search.is_none());
        assert!(timeout(Duration::from_millis(50), effects.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_show_album_failure_leaves_state() {
        let mut mock = MockAlbumService::new();
        mock.expect_album().returning(|link| {
            Err(ServiceError::NotFound {
                link: link.to_string(),
            })
        });

        let container = spawn(mock);
        let mut effects = container.observe_effects();
        container
            .submit(SearchIntent::ShowAlbum {
                link: "album/404".to_string(),
            })
            .unwrap();

        let effect = timeout(Duration::from_secs(5), effects.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            effect,
            ViewEffect::Toast("album failed for link: album/404".to_string())
        );
        assert_eq!(container.current_state(), SearchState::default());
        assert_eq!(container.transitions(), 0);
    }

    #[tokio::test]
    async fn test_blank_query_settles_only_after_clear() {
        let mut mock = MockAlbumService::new();
        mock.expect_search_albums().never();

        let container = spawn(mock);
        assert!(timeout(Duration::from_millis(50), query_settled(&container, "  "))
            .await
            .is_err());

        container
            .submit(SearchIntent::Search {
                query: "  ".to_string(),
            })
            .unwrap();
        let state = timeout(Duration::from_secs(5), query_settled(&container, "  "))
            .await
            .unwrap()
            .unwrap();
        assert!(state.search.is_none());
        assert_eq!(container.transitions(), 1);
    }

    #[tokio::test]
    async fn test_query_intents_skip_repeats() {
        let texts = futures::stream::iter(vec![
            "k".to_string(),
            "ku".to_string(),
            "ku".to_string(),
            "kuu".to_string(),
        ]);
        let intents: Vec<SearchIntent> = query_intents(texts).collect().await;
        let queries: Vec<String> = intents
            .into_iter()
            .map(|intent| match intent {
                SearchIntent::Search { query } => query,
                other => panic!("unexpected intent {:?}", other),
            })
            .collect();
        assert_eq!(queries, vec!["k", "ku", "kuu"]);
    }
}
