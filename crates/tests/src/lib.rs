//! # Integration Tests
//!
//! End-to-end tests over the full workspace.
//!
//! Responsibilities:
//! - Multi-store ordering scenarios driven through the hub
//! - Registration/unregistration lifecycle across dispatches
//! - Failure recovery with real payloads

#[cfg(test)]
mod contract_tests {
    use contracts::{DispatchError, DispatchToken};

    #[test]
    fn test_contracts_compile() {
        let token = DispatchToken::mint(1);
        let err = DispatchError::unknown_token(token.clone());
        assert!(err.to_string().contains(token.as_str()));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use contracts::DispatchToken;
    use hub::Hub;
    use serde_json::{json, Value};

    /// Shared store state: the "database" each store maintains
    #[derive(Debug, Default, PartialEq)]
    struct TravelState {
        country: Option<String>,
        city: Option<String>,
        price: Option<u64>,
    }

    fn action_type(payload: &Value) -> Option<&str> {
        payload.get("action").and_then(Value::as_str)
    }

    /// End-to-end test: three stores ordered by wait_for over the hub.
    ///
    /// The price store registers *first* but depends on the city store,
    /// whose token only exists later: the dependency is declared through a
    /// token slot filled in after registration, and the dispatch still runs
    /// country -> city -> price.
    #[test]
    fn test_e2e_ordered_stores_pipeline() {
        let hub: Rc<Hub<Value>> = Rc::new(Hub::new());
        let state = Rc::new(RefCell::new(TravelState::default()));
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let city_slot: Rc<RefCell<Option<DispatchToken>>> = Rc::new(RefCell::new(None));

        // Price store, registered first, waits on the city store
        {
            let state = Rc::clone(&state);
            let order = Rc::clone(&order);
            let city_slot = Rc::clone(&city_slot);
            hub.register(move |d, _| {
                let city_token = city_slot.borrow().clone().unwrap();
                d.wait_for(&[city_token])?;
                let mut state = state.borrow_mut();
                state.price = match state.city.as_deref() {
                    Some("paris") => Some(1200),
                    Some(_) => Some(800),
                    None => None,
                };
                order.borrow_mut().push("price");
                Ok(())
            });
        }

        // Country store: plain registration-order participant
        let country_token = {
            let state = Rc::clone(&state);
            let order = Rc::clone(&order);
            hub.register(move |_, sourced| {
                if action_type(&sourced.payload) == Some("country-update") {
                    let country = sourced.payload["country"].as_str().unwrap().to_string();
                    state.borrow_mut().country = Some(country);
                }
                order.borrow_mut().push("country");
                Ok(())
            })
        };

        // City store waits on the country store
        let city_token = {
            let state = Rc::clone(&state);
            let order = Rc::clone(&order);
            hub.register(move |d, _| {
                d.wait_for(std::slice::from_ref(&country_token))?;
                let mut state = state.borrow_mut();
                state.city = match state.country.as_deref() {
                    Some("france") => Some("paris".to_string()),
                    Some(_) => Some("unknown".to_string()),
                    None => None,
                };
                order.borrow_mut().push("city");
                Ok(())
            })
        };
        *city_slot.borrow_mut() = Some(city_token);

        hub.dispatch_remote(json!({ "action": "country-update", "country": "france" }))
            .unwrap();

        assert_eq!(*order.borrow(), vec!["country", "city", "price"]);
        assert_eq!(
            *state.borrow(),
            TravelState {
                country: Some("france".to_string()),
                city: Some("paris".to_string()),
                price: Some(1200),
            }
        );

        // A second dispatch re-runs every store against the new payload
        hub.dispatch_remote(json!({ "action": "country-update", "country": "spain" }))
            .unwrap();
        assert_eq!(
            *order.borrow(),
            vec!["country", "city", "price", "country", "city", "price"]
        );
        assert_eq!(state.borrow().city.as_deref(), Some("unknown"));
        assert_eq!(state.borrow().price, Some(800));
    }

    /// Register a, then b: dispatch order is [a, b]; after removing b only
    /// a remains
    #[test]
    fn test_e2e_registration_lifecycle() {
        let hub: Rc<Hub<Value>> = Rc::new(Hub::new());
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        {
            let order = Rc::clone(&order);
            hub.register(move |_, _| {
                order.borrow_mut().push("a");
                Ok(())
            });
        }
        let token_b = {
            let order = Rc::clone(&order);
            hub.register(move |_, _| {
                order.borrow_mut().push("b");
                Ok(())
            })
        };

        hub.dispatch_local(json!({})).unwrap();
        assert_eq!(*order.borrow(), vec!["a", "b"]);

        hub.unregister(&token_b).unwrap();
        order.borrow_mut().clear();
        hub.dispatch_local(json!({})).unwrap();
        assert_eq!(*order.borrow(), vec!["a"]);
    }

    /// A three-deep wait chain on the bare dispatcher, without the hub
    #[test]
    fn test_e2e_bare_dispatcher_wait_chain() {
        use dispatcher::Dispatcher;

        let d: Rc<Dispatcher<String>> = Rc::new(Dispatcher::new());
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let token_a = {
            let order = Rc::clone(&order);
            d.register(move |_, _| {
                order.borrow_mut().push("a");
                Ok(())
            })
        };
        let token_b = {
            let order = Rc::clone(&order);
            d.register(move |d, _| {
                d.wait_for(std::slice::from_ref(&token_a))?;
                order.borrow_mut().push("b");
                Ok(())
            })
        };
        {
            let order = Rc::clone(&order);
            d.register(move |d, _| {
                d.wait_for(std::slice::from_ref(&token_b))?;
                order.borrow_mut().push("c");
                Ok(())
            });
        }

        d.dispatch("go".to_string()).unwrap();
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);

        let metrics = d.metrics();
        assert_eq!(metrics.invocation_count, 3);
    }

    /// A store that rejects one payload must not poison later dispatches
    #[test]
    fn test_e2e_failure_recovery() {
        let hub: Rc<Hub<Value>> = Rc::new(Hub::new());
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        {
            let seen = Rc::clone(&seen);
            hub.register(move |_, sourced| {
                seen.borrow_mut()
                    .push(sourced.payload["action"].as_str().unwrap_or("?").to_string());
                Ok(())
            });
        }
        hub.register(|_, sourced| {
            if action_type(&sourced.payload) == Some("explode") {
                return Err(contracts::DispatchError::callback("rejected by store"));
            }
            Ok(())
        });

        assert!(hub
            .dispatch_local(json!({ "action": "explode" }))
            .is_err());
        assert!(!hub.dispatcher().is_dispatching());

        hub.dispatch_local(json!({ "action": "refresh" })).unwrap();
        assert_eq!(*seen.borrow(), vec!["explode", "refresh"]);

        let metrics = hub.dispatcher().metrics();
        assert_eq!(metrics.dispatch_count, 2);
        assert_eq!(metrics.failure_count, 1);
    }
}
