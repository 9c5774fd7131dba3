use serde::Serialize;

use crate::app::{AppContext, MenuError, Result};
use crate::domain::PlaceRef;
use crate::server::{self, AppState};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn serve(ctx: &AppContext, bind: Option<&str>) -> Result<()> {
    let address = bind
        .map(str::to_string)
        .unwrap_or_else(|| ctx.config.server.address());
    let state = AppState {
        service: ctx.service.clone(),
    };
    server::serve(state, &address).await?;
    Ok(())
}

pub async fn menu(ctx: &AppContext, place_id: &str) -> Result<()> {
    let response = ctx.service.menu(&PlaceRef::new(place_id)).await?;
    print_json(&response)
}

pub async fn scrape(ctx: &AppContext, place_id: &str, website: Option<&str>) -> Result<()> {
    if place_id.trim().is_empty() {
        return Err(MenuError::InvalidInput("placeId is required".to_string()));
    }
    let outcome = ctx.orchestrator.scrape_all(place_id, website).await;
    print_json(&outcome)
}

/// Prints frames until the terminal event. Failures arrive in-band as an
/// `error` frame.
pub async fn stream(ctx: &AppContext, place: PlaceRef) -> Result<()> {
    let mut rx = ctx.service.spawn_stream(place);
    while let Some(event) = rx.recv().await {
        print!("{}", event.frame());
    }
    Ok(())
}

pub async fn extract(ctx: &AppContext, url: &str) -> Result<()> {
    url::Url::parse(url)?;
    match ctx.extractor.extract_from_url(url).await {
        Some(text) if !text.is_empty() => println!("{}", text),
        _ => println!("No menu text found at {}", url),
    }
    Ok(())
}
