//! Moving instance-owned resources across a reload.

use std::rc::Rc;

use super::instance::ProgramInstance;

/// What [`carry_over`] moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carryover {
    pub surface: bool,
}

/// Hand the outgoing instance's surface to the incoming one.
///
/// Must run before `outgoing` is dropped. The incoming instance ends up
/// with the very same surface handle, so the window survives the reload.
/// An incoming instance that already has a surface keeps it.
pub fn carry_over(outgoing: &ProgramInstance, incoming: &mut ProgramInstance) -> Carryover {
    let Some(surface) = outgoing.surface() else {
        return Carryover::default();
    };

    if incoming.surface().is_some_and(|own| Rc::ptr_eq(own, surface)) {
        return Carryover::default();
    }

    let carried = incoming.receive_surface(surface);
    if !carried {
        tracing::debug!(
            "`{}` already has a surface; not carrying over",
            incoming.name()
        );
    }
    Carryover { surface: carried }
}
