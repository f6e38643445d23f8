//! Server-sent catalog change events.
//!
//! Each open page holds one stream. Whenever a live catalog snapshot is
//! replaced the stream emits a `refresh` event whose data is the collection
//! name, and the page script reloads itself.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use futures::Stream;
use tokio::sync::watch;

use candela_data::{Collection, Snapshot};

use crate::state::AppState;

/// GET /events/catalog
pub async fn catalog(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let catalog = state.catalog();
    let products = catalog.products.watch();
    let categories = catalog.categories.watch();
    let subcategories = catalog.subcategories.watch();
    let settings = catalog.settings.watch();

    Sse::new(refresh_events(products, categories, subcategories, settings))
        .keep_alive(KeepAlive::default())
}

fn refresh_events<P, C, S, T>(
    mut products: watch::Receiver<Snapshot<P>>,
    mut categories: watch::Receiver<Snapshot<C>>,
    mut subcategories: watch::Receiver<Snapshot<S>>,
    mut settings: watch::Receiver<Snapshot<T>>,
) -> impl Stream<Item = Result<Event, Infallible>>
where
    P: Send + Sync + 'static,
    C: Send + Sync + 'static,
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    async_stream::stream! {
        loop {
            let changed = tokio::select! {
                r = products.changed() => r.map(|()| Collection::Products),
                r = categories.changed() => r.map(|()| Collection::Categories),
                r = subcategories.changed() => r.map(|()| Collection::Subcategories),
                r = settings.changed() => r.map(|()| Collection::Settings),
            };
            match changed {
                Ok(collection) => {
                    yield Ok(Event::default().event("refresh").data(collection.as_str()));
                }
                // Subscription gone; the page falls back to its own reconnect.
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;

    use super::*;

    fn snapshot(value: u32) -> Snapshot<u32> {
        Snapshot {
            data: Arc::new(value),
            loading: false,
        }
    }

    #[tokio::test]
    async fn test_emits_one_event_per_change_and_ends_when_closed() {
        let (p_tx, p_rx) = watch::channel(snapshot(0));
        let (c_tx, c_rx) = watch::channel(snapshot(0));
        let (s_tx, s_rx) = watch::channel(snapshot(0));
        let (t_tx, t_rx) = watch::channel(snapshot(0));

        let stream = refresh_events(p_rx, c_rx, s_rx, t_rx);
        futures::pin_mut!(stream);

        c_tx.send_replace(snapshot(1));
        assert!(stream.next().await.unwrap().is_ok());

        drop((p_tx, c_tx, s_tx, t_tx));
        assert!(stream.next().await.is_none());
    }
}
