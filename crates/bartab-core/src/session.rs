//! # Session
//!
//! The single-writer container that owns the current [`AppState`].
//!
//! ## Thread Safety
//! The state lives behind a `Mutex`. Every dispatch holds the lock for the
//! whole validate → apply → commit sequence, so concurrent callers are
//! serialized and nobody ever observes a half-applied action.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session::dispatch(action, actor)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock state                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate raw input (table names, product fields, restock ceiling)      │
//! │       ├── internal action ──► Rejection (InternalAction)                │
//! │       ├── blocking error ──► Rejection + error notifications            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Context { clock.now(), clock.local_hour(), actor }                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  engine::dispatch ──► replace state, push notifications to the inbox    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Timelike, Utc};
use tracing::{debug, info};

use crate::action::{Action, ProductPatch};
use crate::catalog::apply_patch;
use crate::config::EngineConfig;
use crate::engine::{self, Context, Rejection};
use crate::error::{CoreError, ValidationError, ValidationWarning};
use crate::state::AppState;
use crate::types::{Notification, Percent};
use crate::validation::{
    validate_order_item, validate_patch, validate_product, validate_table_name, NewProduct,
    OrderItemDraft, ProductDraft, Validated,
};
use crate::{STOCK_MAX, SYSTEM_ACTOR};

// =============================================================================
// Clock
// =============================================================================

/// Source of the current time and local hour.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local hour of day (0-23), used for happy-hour pricing.
    fn local_hour(&self) -> u8;
}

/// Wall-clock time, hour in the machine's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u8 {
        Local::now().hour() as u8
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub hour: u8,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, hour: u8) -> Self {
        FixedClock { now, hour }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_hour(&self) -> u8 {
        self.hour
    }
}

// =============================================================================
// Session
// =============================================================================

/// Owns the state and serializes every mutation.
pub struct Session {
    state: Mutex<AppState>,
    inbox: Mutex<VecDeque<Notification>>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // the state is replaced wholesale, so a poisoned lock still holds a
    // consistent value
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Creates a session on the system clock.
    pub fn new(state: AppState, config: EngineConfig) -> Self {
        Session::with_clock(state, config, SystemClock)
    }

    pub fn with_clock(
        mut state: AppState,
        config: EngineConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        state.audit_log.set_capacity(config.audit_capacity);
        info!(
            products = state.products.len(),
            orders = state.orders.len(),
            "Session started"
        );
        Session {
            state: Mutex::new(state),
            inbox: Mutex::new(VecDeque::new()),
            clock: Box::new(clock),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AppState {
        lock(&self.state).clone()
    }

    /// Runs a read-only projection against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&lock(&self.state))
    }

    /// Validates and applies an action on behalf of `actor`.
    ///
    /// Returns the notifications of the accepted action (validation warnings
    /// first). Every notification is also kept in the inbox.
    ///
    /// Internal actions are refused here; a snapshot goes through
    /// [`Session::restore`].
    pub fn dispatch(&self, action: Action, actor: &str) -> Result<Vec<Notification>, Rejection> {
        let mut state = lock(&self.state);
        let (action, warnings) = self.prevalidate(&state, action)?;
        self.commit(&mut state, action, actor, warnings)
    }

    /// Validates a raw product form and adds the product.
    pub fn add_product(
        &self,
        draft: &ProductDraft,
        actor: &str,
    ) -> Result<Vec<Notification>, Rejection> {
        let mut state = lock(&self.state);
        let checked = validate_product(draft, &state.products);
        let (product, warnings) = self.accept(checked)?;
        self.commit(&mut state, Action::AddProduct { product }, actor, warnings)
    }

    /// Adds `qty` units of a product, one `AddItem` per unit.
    ///
    /// The quantity is clamped to `[1, 999]` first. Stops at the first refused
    /// unit; fails only if no unit could be added. Returns how many units were
    /// added with the collected notifications.
    pub fn add_quantity(
        &self,
        order_id: &str,
        product_id: &str,
        qty: f64,
        notes: Option<String>,
        discount: Percent,
        actor: &str,
    ) -> Result<(u32, Vec<Notification>), Rejection> {
        let mut state = lock(&self.state);
        let price = state
            .product(product_id)
            .map(|p| p.price.units() as f64)
            .unwrap_or_default();
        let checked = validate_order_item(&OrderItemDraft { qty, price });
        let (line, warnings) = self.accept(checked)?;

        let mut notifications = self.warning_notifications(&warnings);
        self.push_notifications(&notifications);

        let mut added = 0;
        for _ in 0..line.qty {
            let action = Action::AddItem {
                order_id: order_id.to_string(),
                product_id: product_id.to_string(),
                notes: notes.clone(),
                discount,
            };
            match self.commit(&mut state, action, actor, Vec::new()) {
                Ok(mut emitted) => {
                    notifications.append(&mut emitted);
                    added += 1;
                }
                Err(rejection) if added == 0 => return Err(rejection),
                Err(mut rejection) => {
                    notifications.append(&mut rejection.notifications);
                    break;
                }
            }
        }

        debug!(
            order_id,
            product_id,
            requested = line.qty,
            added,
            "Quantity added"
        );
        Ok((added, notifications))
    }

    /// Replaces the state with a persisted snapshot (not audited).
    pub fn restore(&self, snapshot: AppState) -> Result<(), Rejection> {
        let mut state = lock(&self.state);
        let ctx = self.context(SYSTEM_ACTOR);
        let restore = Action::RestoreSnapshot(Box::new(snapshot));
        let transition = engine::dispatch(&state, &restore, &ctx)?;
        *state = transition.state;
        state.audit_log.set_capacity(self.config.audit_capacity);
        info!(orders = state.orders.len(), "Snapshot restored");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Notification inbox
    // -------------------------------------------------------------------------

    /// Notifications not yet dismissed, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.inbox).iter().cloned().collect()
    }

    /// Removes one notification. Returns false for unknown ids.
    pub fn dismiss_notification(&self, id: &str) -> bool {
        let mut inbox = lock(&self.inbox);
        let before = inbox.len();
        inbox.retain(|n| n.id != id);
        inbox.len() != before
    }

    pub fn clear_notifications(&self) {
        lock(&self.inbox).clear();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn context(&self, actor: &str) -> Context {
        Context::new(self.clock.now(), self.clock.local_hour()).with_actor(actor)
    }

    fn commit(
        &self,
        state: &mut AppState,
        action: Action,
        actor: &str,
        warnings: Vec<ValidationWarning>,
    ) -> Result<Vec<Notification>, Rejection> {
        let ctx = self.context(actor);
        match engine::dispatch(state, &action, &ctx) {
            Ok(transition) => {
                *state = transition.state;
                let mut notifications = self.warning_notifications(&warnings);
                notifications.extend(transition.notifications);
                self.push_notifications(&notifications);
                Ok(notifications)
            }
            Err(rejection) => {
                self.push_notifications(&rejection.notifications);
                Err(rejection)
            }
        }
    }

    /// Runs the input checks that belong in front of the engine and returns
    /// the (possibly sanitized) action.
    fn prevalidate(
        &self,
        state: &AppState,
        action: Action,
    ) -> Result<(Action, Vec<ValidationWarning>), Rejection> {
        if action.is_internal() {
            let rejection = Rejection {
                reason: CoreError::InternalAction(action.kind().to_string()),
                notifications: Vec::new(),
            };
            return Err(rejection);
        }

        let allow = self.config.allow_duplicate_table_names;
        match action {
            Action::CreateOrder { name } => {
                let checked = validate_table_name(&name, state.order_names(), allow);
                let (name, warnings) = self.accept(checked)?;
                Ok((Action::CreateOrder { name }, warnings))
            }
            Action::SplitOrder {
                order_id,
                item_ids,
                new_order_name,
            } => {
                let checked = validate_table_name(&new_order_name, state.order_names(), allow);
                let (new_order_name, warnings) = self.accept(checked)?;
                Ok((
                    Action::SplitOrder {
                        order_id,
                        item_ids,
                        new_order_name,
                    },
                    warnings,
                ))
            }
            Action::AddProduct { product } => {
                let checked = validate_product(&draft_of(&product, None), &state.products);
                let (product, warnings) = self.accept(checked)?;
                Ok((Action::AddProduct { product }, warnings))
            }
            Action::UpdateProduct { id, patch } => {
                // validate the product as it would look after the patch
                let Some(current) = state.product(&id) else {
                    return Ok((Action::UpdateProduct { id, patch }, Vec::new()));
                };
                let mut merged = current.clone();
                apply_patch(&mut merged, &patch);
                let draft = ProductDraft::from_product(&merged);
                let checked = validate_product(&draft, &state.products);
                let (product, warnings) = self.accept(checked)?;

                let mut full = ProductPatch::from_new_product(product);
                full.happy_hour_active = patch.happy_hour_active;
                Ok((Action::UpdateProduct { id, patch: full }, warnings))
            }
            Action::BulkUpdateProducts {
                product_ids,
                updates,
            } => {
                let (updates, mut warnings) = self.accept(validate_patch(&updates))?;
                for current in &state.products {
                    if !product_ids.contains(&current.id) {
                        continue;
                    }
                    let mut merged = current.clone();
                    apply_patch(&mut merged, &updates);
                    let draft = ProductDraft::from_product(&merged);
                    let (_, found) = self.accept(validate_product(&draft, &state.products))?;
                    for warning in found {
                        if !warnings.contains(&warning) {
                            warnings.push(warning);
                        }
                    }
                }
                Ok((
                    Action::BulkUpdateProducts {
                        product_ids,
                        updates,
                    },
                    warnings,
                ))
            }
            Action::RestockProduct { id, quantity } => {
                let room = state
                    .product(&id)
                    .map_or(quantity, |p| STOCK_MAX.saturating_sub(p.stock));
                if quantity <= room {
                    return Ok((Action::RestockProduct { id, quantity }, Vec::new()));
                }
                let warning = ValidationWarning::Clamped {
                    field: "stock".to_string(),
                    max: STOCK_MAX as i64,
                };
                Ok((Action::RestockProduct { id, quantity: room }, vec![warning]))
            }
            other => Ok((other, Vec::new())),
        }
    }

    /// Splits a validation result into value and warnings, or a rejection
    /// carrying one error notification per error.
    fn accept<T>(&self, checked: Validated<T>) -> Result<(T, Vec<ValidationWarning>), Rejection> {
        let now = self.clock.now();
        checked.into_result().map_err(|errors| {
            let notifications = errors
                .iter()
                .map(|e| Notification::error(e.to_string(), now))
                .collect();
            let reason = errors.into_iter().next().map(CoreError::Validation).unwrap_or(
                CoreError::Validation(ValidationError::Required {
                    field: "input".to_string(),
                }),
            );
            let rejection = Rejection {
                reason,
                notifications,
            };
            self.push_notifications(&rejection.notifications);
            rejection
        })
    }

    fn warning_notifications(&self, warnings: &[ValidationWarning]) -> Vec<Notification> {
        let now = self.clock.now();
        warnings
            .iter()
            .map(|w| Notification::warn(w.to_string(), now))
            .collect()
    }

    fn push_notifications(&self, notifications: &[Notification]) {
        if notifications.is_empty() {
            return;
        }
        let mut inbox = lock(&self.inbox);
        inbox.extend(notifications.iter().cloned());
        while inbox.len() > self.config.notification_capacity.max(1) {
            inbox.pop_front();
        }
    }
}

fn draft_of(product: &NewProduct, id: Option<String>) -> ProductDraft {
    ProductDraft {
        id,
        name: product.name.clone(),
        category_id: product.category_id.clone(),
        price: product.price.units() as f64,
        stock: product.stock as f64,
        low_stock: product.low_stock as f64,
        happy_hour_discount: product.happy_hour_discount.value() as f64,
        happy_hour_start: product.happy_hour_start,
        happy_hour_end: product.happy_hour_end,
        image: product.image.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::seed::demo_state;
    use crate::types::NotificationKind;
    use std::sync::Arc;

    fn session_at(hour: u8, config: EngineConfig) -> Session {
        let now = Utc::now();
        Session::with_clock(demo_state(now), config, FixedClock::new(now, hour))
    }

    fn session() -> Session {
        session_at(12, EngineConfig::default())
    }

    #[test]
    fn test_duplicate_table_name_allowed_warns() {
        let session = session();
        let notes = session
            .dispatch(
                Action::CreateOrder {
                    name: " mesa 1 ".into(),
                },
                "u_emp1",
            )
            .unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Warn);
        let state = session.snapshot();
        assert_eq!(state.orders.len(), 3);
        assert_eq!(state.orders[0].name, "mesa 1");
    }

    #[test]
    fn test_duplicate_table_name_refused() {
        let session = session_at(
            12,
            EngineConfig {
                allow_duplicate_table_names: false,
                ..Default::default()
            },
        );
        let rejection = session
            .dispatch(
                Action::CreateOrder {
                    name: "MESA 2".into(),
                },
                "u_emp1",
            )
            .unwrap_err();

        assert!(matches!(
            rejection.reason,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(rejection.notifications[0].kind, NotificationKind::Error);
        assert_eq!(session.snapshot().orders.len(), 2);
        assert!(session.snapshot().audit_log.is_empty());
    }

    #[test]
    fn test_empty_split_name_refused() {
        let session = session();
        let state = session.snapshot();
        let action = Action::SplitOrder {
            order_id: state.orders[1].id.clone(),
            item_ids: vec![state.orders[1].items[0].id.clone()],
            new_order_name: "   ".into(),
        };
        assert!(session.dispatch(action, "u_emp1").is_err());
    }

    #[test]
    fn test_add_quantity_repeats_single_adds() {
        let session = session();
        let order_id = session.snapshot().orders[0].id.clone();

        let (added, _) = session
            .add_quantity(&order_id, "p_per", 3.0, None, Percent::zero(), "u_emp1")
            .unwrap();
        assert_eq!(added, 3);

        let state = session.snapshot();
        assert_eq!(state.product("p_per").unwrap().stock, 9);
        assert_eq!(state.order(&order_id).unwrap().quantity_of("p_per"), 3);
        assert_eq!(state.audit_log.by_action("addItem").count(), 3);
    }

    #[test]
    fn test_add_quantity_stops_when_stock_runs_out() {
        let session = session();
        let order_id = session.snapshot().orders[0].id.clone();

        let (added, notes) = session
            .add_quantity(&order_id, "p_sal", 20.0, None, Percent::zero(), "u_emp1")
            .unwrap();

        assert_eq!(added, 9);
        assert_eq!(notes.last().unwrap().message, "Out of stock: Salchipapa");
        assert_eq!(session.snapshot().product("p_sal").unwrap().stock, 0);

        let rejection = session
            .add_quantity(&order_id, "p_sal", 1.0, None, Percent::zero(), "u_emp1")
            .unwrap_err();
        assert!(rejection.reason.is_policy_rejection());
    }

    #[test]
    fn test_happy_hour_uses_clock_hour() {
        let session = session_at(18, EngineConfig::default());
        let order_id = session.snapshot().orders[0].id.clone();
        session
            .dispatch(
                Action::AddItem {
                    order_id: order_id.clone(),
                    product_id: "p_poker".into(),
                    notes: None,
                    discount: Percent::zero(),
                },
                "u_emp1",
            )
            .unwrap();

        let state = session.snapshot();
        let line = state.order(&order_id).unwrap().items.last().unwrap().clone();
        assert_eq!(line.price, Money::from_units(5100));
    }

    #[test]
    fn test_add_product_auto_corrects_low_stock() {
        let session = session();
        let draft = ProductDraft {
            name: "Michelada".into(),
            price: 9000.0,
            stock: 5.0,
            low_stock: 10.0,
            ..Default::default()
        };

        let notes = session.add_product(&draft, "u_admin").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Warn);
        let state = session.snapshot();
        assert_eq!(state.products[0].name, "Michelada");
        assert_eq!(state.products[0].low_stock, 5);
    }

    #[test]
    fn test_update_product_is_validated_after_merge() {
        let session = session();
        let bad = Action::UpdateProduct {
            id: "p_agua".into(),
            patch: ProductPatch {
                name: Some("  ".into()),
                ..Default::default()
            },
        };
        assert!(session.dispatch(bad, "u_admin").is_err());

        let good = Action::UpdateProduct {
            id: "p_agua".into(),
            patch: ProductPatch {
                low_stock: Some(500),
                ..Default::default()
            },
        };
        session.dispatch(good, "u_admin").unwrap();
        let agua = session.snapshot().product("p_agua").unwrap().clone();
        assert_eq!(agua.low_stock, agua.stock);
        assert_eq!(agua.name, "Agua");
    }

    #[test]
    fn test_inbox_is_bounded_and_dismissable() {
        let session = session_at(
            12,
            EngineConfig {
                notification_capacity: 2,
                ..Default::default()
            },
        );
        for _ in 0..3 {
            session.dispatch(Action::RestockLow, "u_admin").unwrap();
        }
        let inbox = session.notifications();
        assert_eq!(inbox.len(), 2);

        assert!(session.dismiss_notification(&inbox[0].id));
        assert!(!session.dismiss_notification(&inbox[0].id));
        assert_eq!(session.notifications().len(), 1);
        session.clear_notifications();
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn test_audit_capacity_from_config() {
        let session = session_at(
            12,
            EngineConfig {
                audit_capacity: 2,
                ..Default::default()
            },
        );
        for _ in 0..5 {
            session.dispatch(Action::RestockLow, "u_admin").unwrap();
        }
        assert_eq!(session.read(|s| s.audit_log.len()), 2);
    }

    #[test]
    fn test_restore_replaces_state() {
        let session = session();
        let saved = session.snapshot();
        session
            .dispatch(
                Action::CreateOrder {
                    name: "Terraza".into(),
                },
                "u_emp1",
            )
            .unwrap();

        session.restore(saved.clone()).unwrap();
        assert_eq!(session.snapshot(), saved);
    }

    #[test]
    fn test_concurrent_dispatch_conserves_stock() {
        let session = Arc::new(session());
        let order_id = session.snapshot().orders[0].id.clone();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let session = Arc::clone(&session);
                let order_id = order_id.clone();
                scope.spawn(move || {
                    for _ in 0..10 {
                        let _ = session.dispatch(
                            Action::AddItem {
                                order_id: order_id.clone(),
                                product_id: "p_hielo".into(),
                                notes: None,
                                discount: Percent::zero(),
                            },
                            "u_emp1",
                        );
                    }
                });
            }
        });

        let state = session.snapshot();
        assert_eq!(state.product("p_hielo").unwrap().stock, 0);
        assert_eq!(state.reserved_quantity("p_hielo"), 30);
    }

    #[test]
    fn test_restore_cannot_be_dispatched() {
        let session = session();
        session
            .dispatch(
                Action::CreateOrder {
                    name: "Terraza".into(),
                },
                "u_emp1",
            )
            .unwrap();
        session.dispatch(Action::RestockLow, "u_admin").unwrap();
        let before = session.snapshot();

        let rejection = session
            .dispatch(
                Action::RestoreSnapshot(Box::new(AppState::default())),
                "u_emp1",
            )
            .unwrap_err();

        assert_eq!(
            rejection.reason,
            CoreError::InternalAction("restoreSnapshot".into())
        );
        let after = session.snapshot();
        assert_eq!(after, before);
        assert_eq!(after.audit_log.len(), 2);
    }

    #[test]
    fn test_bulk_update_is_validated_per_product() {
        let session = session();
        let before = session.snapshot();
        let bad = Action::BulkUpdateProducts {
            product_ids: vec!["p_club".into(), "p_agua".into()],
            updates: ProductPatch {
                price: Some(Money::zero()),
                stock: Some(5_000_000),
                low_stock: Some(9_000_000),
                ..Default::default()
            },
        };
        let rejection = session.dispatch(bad, "u_admin").unwrap_err();
        assert!(matches!(
            rejection.reason,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
        assert_eq!(session.snapshot(), before);

        let clamped = Action::BulkUpdateProducts {
            product_ids: vec!["p_club".into()],
            updates: ProductPatch {
                stock: Some(5_000_000),
                low_stock: Some(9_000_000),
                ..Default::default()
            },
        };
        let notes = session.dispatch(clamped, "u_admin").unwrap();
        assert!(notes.iter().any(|n| n.kind == NotificationKind::Warn));

        let club = session.snapshot().product("p_club").unwrap().clone();
        assert_eq!(club.stock, STOCK_MAX);
        assert_eq!(club.low_stock, crate::LOW_STOCK_MAX);
        assert!(club.price.is_positive());
    }

    #[test]
    fn test_restock_is_clamped_to_ceiling() {
        let session = session();
        session
            .dispatch(
                Action::BulkUpdateProducts {
                    product_ids: vec!["p_agua".into()],
                    updates: ProductPatch {
                        stock: Some(STOCK_MAX - 10),
                        ..Default::default()
                    },
                },
                "u_admin",
            )
            .unwrap();

        let notes = session
            .dispatch(
                Action::RestockProduct {
                    id: "p_agua".into(),
                    quantity: 500,
                },
                "u_admin",
            )
            .unwrap();

        assert_eq!(notes[0].kind, NotificationKind::Warn);
        assert_eq!(notes[1].message, "Agua: +10 units");
        assert_eq!(
            session.snapshot().product("p_agua").unwrap().stock,
            STOCK_MAX
        );
    }
}
