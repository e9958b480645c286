use std::future::Future;
use std::time::Duration;

use crate::{AnimationTarget, ListDom};

/// An opacity tween for enter/exit transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, start_ms: u64, duration_ms: u64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(1),
            easing,
        }
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    pub fn sample(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0);
        let eased = self.easing.sample(t);
        (self.from + (self.to - self.from) * eased).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    #[default]
    SmoothStep,
    EaseInOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
        }
    }

    /// Parses the authored easing names (`"linear"`, `"ease"`, `"ease-in-out"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "ease" | "smooth" => Some(Self::SmoothStep),
            "ease-in-out" | "ease-in-out-cubic" => Some(Self::EaseInOutCubic),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            easing: Easing::SmoothStep,
        }
    }
}

impl Transition {
    pub fn new(duration_ms: u64, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
        }
    }

    /// Enter fades `0 -> 1`, exit fades `1 -> 0`.
    pub fn tween(&self, phase: Phase, start_ms: u64) -> Tween {
        let (from, to) = match phase {
            Phase::Enter => (0.0, 1.0),
            Phase::Exit => (1.0, 0.0),
        };
        Tween::new(from, to, start_ms, self.duration_ms, self.easing)
    }
}

/// Which transitions a list runs. `None` disables that kind of animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationOptions {
    pub items: Option<Transition>,
    pub list: Option<Transition>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            items: Some(Transition::default()),
            list: None,
        }
    }
}

impl AnimationOptions {
    pub fn disabled() -> Self {
        Self {
            items: None,
            list: None,
        }
    }

    pub fn with_items(mut self, items: Option<Transition>) -> Self {
        self.items = items;
        self
    }

    pub fn with_list(mut self, list: Option<Transition>) -> Self {
        self.list = list;
        self
    }
}

/// Runs one enter/exit animation to completion.
///
/// The render orchestrator awaits every returned future before it reports the cycle settled.
pub trait Animator<E> {
    fn animate(
        &self,
        target: AnimationTarget<'_, E>,
        phase: Phase,
        transition: Transition,
    ) -> impl Future<Output = ()>;
}

/// Completes every animation immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAnimation;

impl<E> Animator<E> for NoAnimation {
    async fn animate(&self, _target: AnimationTarget<'_, E>, _phase: Phase, _transition: Transition) {}
}

/// Drives opacity tweens through [`ListDom::set_opacity`] on a fixed frame interval.
#[derive(Clone, Debug)]
pub struct TweenAnimator<D> {
    dom: D,
    frame: Duration,
}

impl<D> TweenAnimator<D> {
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            frame: Duration::from_millis(16),
        }
    }

    pub fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame = Duration::from_millis(frame_ms.max(1));
        self
    }
}

impl<D: ListDom> Animator<D::Element> for TweenAnimator<D> {
    async fn animate(
        &self,
        target: AnimationTarget<'_, D::Element>,
        phase: Phase,
        transition: Transition,
    ) {
        let start = tokio::time::Instant::now();
        let tween = transition.tween(phase, 0);
        loop {
            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            self.dom.set_opacity(target, tween.sample(now_ms));
            if tween.is_done(now_ms) {
                break;
            }
            tokio::time::sleep(self.frame).await;
        }
    }
}
