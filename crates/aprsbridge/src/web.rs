//! Read-only monitor endpoints over the shared view model.

use crate::snapshot::{AircraftSnapshot, Monitor, VesselSnapshot};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;
use warp::Filter;

/// An API error serializable to JSON.
#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

async fn vessels(
    monitor: Arc<Monitor>,
) -> Result<warp::reply::Json, Infallible> {
    let board = monitor.vessels.lock().await;
    Ok::<_, Infallible>(warp::reply::json(
        &board.vessels.values().collect::<Vec<&VesselSnapshot>>(),
    ))
}

async fn aircraft(
    monitor: Arc<Monitor>,
) -> Result<warp::reply::Json, Infallible> {
    let aircraft = monitor.aircraft.lock().await;
    Ok::<_, Infallible>(warp::reply::json(
        &aircraft.values().collect::<Vec<&AircraftSnapshot>>(),
    ))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Route not found, try /vessels or /aircraft";
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Only GET queries are supported";
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Unknown error";
    }

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        message: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}

pub async fn serve(monitor: Arc<Monitor>, port: u16) {
    let monitor_vessels = monitor.clone();
    let vessels_route = warp::path("vessels")
        .and(warp::any().map(move || monitor_vessels.clone()))
        .and_then(|monitor: Arc<Monitor>| async move {
            vessels(monitor).await
        });

    let monitor_aircraft = monitor.clone();
    let aircraft_route = warp::path("aircraft")
        .and(warp::any().map(move || monitor_aircraft.clone()))
        .and_then(|monitor: Arc<Monitor>| async move {
            aircraft(monitor).await
        });

    let routes = warp::get()
        .and(vessels_route.or(aircraft_route))
        .recover(handle_rejection);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
