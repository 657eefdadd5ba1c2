use crate::app::AppState;
use async_stream::try_stream;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures::Stream;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::broadcast::error::RecvError;

pub async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("new connection to sse stream >>>");

    let mut rx = state.get_sender().subscribe();

    Sse::new(try_stream! {
        loop {
            match rx.recv().await {
                Ok(app_event) => match Event::default().json_data(&app_event) {
                    Ok(event) => {
                        yield event;
                    }
                    Err(e) => tracing::error!(error = ?e, "failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "sse subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
    .keep_alive(KeepAlive::default())
}
