//! Ordered stores demo
//!
//! Three stores (country / city / price) share one hub. The price store
//! depends on the city store, which depends on the country store; the
//! dependencies are declared by the stores themselves via `wait_for`, not
//! by registration order. The price store also fires a remote follow-up
//! payload mid-dispatch to show the hub's deferral path.
//!
//! Run with:
//! ```sh
//! cargo run --bin ordered_stores
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use contracts::DispatchToken;
use hub::Hub;

#[derive(Debug, Default)]
struct TravelState {
    country: Option<String>,
    city: Option<String>,
    price: Option<u64>,
    confirmations: u64,
}

fn main() -> Result<()> {
    init_logging();

    let hub: Rc<Hub<Value>> = Rc::new(Hub::new());
    let state = Rc::new(RefCell::new(TravelState::default()));

    // Country store: reacts to country updates
    let country_token = {
        let state = Rc::clone(&state);
        hub.register(move |_, sourced| {
            if sourced.payload["action"] == "country-update" {
                let country = sourced.payload["country"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                info!(country = %country, source = %sourced.source, "country store updated");
                state.borrow_mut().country = Some(country);
            }
            Ok(())
        })
    };

    // City store: picks a default city once the country store has settled
    let city_token = {
        let state = Rc::clone(&state);
        let country_token = country_token.clone();
        hub.register(move |d, sourced| {
            if sourced.payload["action"] != "country-update" {
                return Ok(());
            }
            d.wait_for(std::slice::from_ref(&country_token))?;
            let mut state = state.borrow_mut();
            let city = match state.country.as_deref() {
                Some("france") => "paris",
                Some("japan") => "tokyo",
                _ => "unknown",
            };
            info!(city, "city store updated");
            state.city = Some(city.to_string());
            Ok(())
        })
    };

    // Price store: needs both upstream stores, then confirms via a remote
    // payload (deferred because a dispatch is in flight)
    {
        let state = Rc::clone(&state);
        let hub_ref = Rc::clone(&hub);
        let waits: Vec<DispatchToken> = vec![country_token, city_token];
        hub.register(move |d, sourced| {
            match sourced.payload["action"].as_str() {
                Some("country-update") => {
                    d.wait_for(&waits)?;
                    let mut state = state.borrow_mut();
                    let price = match state.city.as_deref() {
                        Some("paris") => 1200,
                        Some("tokyo") => 1500,
                        _ => 800,
                    };
                    info!(price, "price store updated");
                    state.price = Some(price);
                    hub_ref.dispatch_remote(json!({ "action": "booking-confirmed" }))?;
                }
                Some("booking-confirmed") => {
                    state.borrow_mut().confirmations += 1;
                    info!("booking confirmed");
                }
                _ => {}
            }
            Ok(())
        });
    }

    hub.dispatch_local(json!({ "action": "country-update", "country": "france" }))?;
    hub.dispatch_local(json!({ "action": "country-update", "country": "japan" }))?;

    let metrics = hub.dispatcher().metrics();
    info!(
        state = ?state.borrow(),
        dispatches = metrics.dispatch_count,
        invocations = metrics.invocation_count,
        "demo finished"
    );

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
