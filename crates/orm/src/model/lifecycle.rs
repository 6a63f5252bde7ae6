//! Model lifecycle - construction and event publication

use std::any::type_name;

use crate::context::Context;
use crate::events::{EventContext, ModelEvent, Outcome};
use crate::model::core_trait::{Model, ModelState};
use crate::registry::maybe_boot;
use crate::value::Row;

/// Build a fresh instance: boot the type if needed, initialize, then
/// snapshot the original attributes
pub(crate) fn construct<M: Model>(ctx: &Context) -> M {
    maybe_boot::<M>(ctx);

    let state = ModelState::new(ctx.clone(), M::PRIMARY_KEY, M::OBJECT_TYPE);
    let mut model = M::from_state(state);

    model.initialize();
    model.state_mut().attributes.sync_original();
    model
}

/// Build a persisted instance from a raw row and fire `retrieved`
pub(crate) fn hydrate<M: Model>(ctx: &Context, row: Row) -> M {
    let mut model = construct::<M>(ctx);

    {
        let state = model.state_mut();
        state.exists = true;
        state.attributes.set_raw(row, true);
    }

    fire(&model, ModelEvent::Retrieved);
    model
}

/// Publish `event` for `model`. Cancellable events return the listeners'
/// verdict; the rest always proceed.
pub(crate) fn fire<M: Model>(model: &M, event: ModelEvent) -> Outcome {
    let state = model.state();
    let ctx = state.context();
    let hook = ctx.hook(M::OBJECT_TYPE, event.as_str());

    let event_ctx = EventContext {
        event,
        hook: &hook,
        object_type: M::OBJECT_TYPE,
        model: type_name::<M>(),
        attributes: Some(&state.attributes),
        exists: state.exists,
    };

    dispatch(ctx, &event_ctx)
}

/// Publish an event that has no instance, such as `booting`
pub(crate) fn fire_static<M: Model>(ctx: &Context, event: ModelEvent) -> Outcome {
    let hook = ctx.hook(M::OBJECT_TYPE, event.as_str());

    let event_ctx = EventContext {
        event,
        hook: &hook,
        object_type: M::OBJECT_TYPE,
        model: type_name::<M>(),
        attributes: None,
        exists: false,
    };

    dispatch(ctx, &event_ctx)
}

fn dispatch(ctx: &Context, event: &EventContext<'_>) -> Outcome {
    if event.event.is_cancellable() {
        ctx.events().filter(event)
    } else {
        ctx.events().action(event);
        Outcome::Proceed
    }
}
