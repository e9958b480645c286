//! Async controllers that bind the `cmslist` engine to a page.
//!
//! The `cmslist` crate is UI-agnostic and synchronous. This crate adds the parts that touch the
//! outside world, behind small traits so they stay framework-neutral:
//!
//! - [`ListDom`] / [`FiltersDom`]: the DOM subtree of one list and its filters form
//! - [`Animator`]: enter/exit transitions ([`TweenAnimator`] drives opacity tweens)
//! - [`ListController`] / [`FiltersController`]: per-list operation queue and render cycle
//! - [`AttributesRegistry`]: host-script callbacks keyed by feature
//! - [`feed`]: product feed decoding and list population
//!
//! Operations on one list are serialized through its [`OpQueue`]; each resolves once its render
//! (animations included) settled.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod animation;
mod controller;
mod dom;
mod error;
pub mod feed;
mod filters;
mod registry;
mod render;
mod sync;

#[cfg(test)]
mod tests;

pub use animation::{
    AnimationOptions, Animator, Easing, NoAnimation, Phase, Transition, Tween, TweenAnimator,
};
pub use controller::ListController;
pub use dom::{AnimationTarget, DisplayKey, FiltersDom, ListDom, TextKey, read_field};
pub use error::{FeedError, MarkupError};
pub use feed::{Product, ProductFeed, TemplateDom};
pub use filters::FiltersController;
pub use registry::{AttributesRegistry, Feature};
pub use render::{RenderCycle, RenderPlan, RenderTracker};
pub use sync::OpQueue;
