//! `memlane-kernel` – Mode & Interaction
//!
//! Decides how the session is presented and regulates what every visible
//! memory is doing.  Nothing here touches I/O; time is passed in.
//!
//! # Modules
//!
//! - [`capability`] – [`CapabilityDetector`][capability::CapabilityDetector]:
//!   turns the host's immersive-support signal into a [`RenderMode`] once
//!   per session, failing safe to the flat mode.
//! - [`interaction`] – [`InteractionMachine`][interaction::InteractionMachine]:
//!   the per-item idle / hovered / dwelling / expanded / selected-cooldown
//!   state machine, emitting a selection event on activation.
//! - [`timer`] – [`ItemTimer`][timer::ItemTimer]: the cancellable deadline
//!   each machine owns for its dwell and cooldown.

pub mod capability;
pub mod interaction;
pub mod timer;

pub use capability::{CapabilityDetector, ImmersiveSignal, RenderMode};
pub use interaction::{
    DwellPolicy, InputEvent, InputSource, InteractionMachine, InteractionOutcome,
    InteractionTiming, Transition,
};
pub use timer::{ItemTimer, TimerKind};
