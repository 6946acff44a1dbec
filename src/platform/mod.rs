//! Platform abstraction layer
//!
//! Detects the browser features the game loop and input handlers rely on,
//! and supplies the clocks used for frame timing and report timestamps.
//! Native builds have no browser, so [`probe`] returns `None` there.

/// Browser features the game needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSupport {
    /// `window.requestAnimationFrame`
    pub animation_frame: bool,
    /// `canvas.getContext("2d")`
    pub canvas_2d: bool,
    /// `addEventListener` on the window
    pub event_listeners: bool,
    /// `Event.preventDefault` (stops wheel/touch from scrolling the page)
    pub prevent_default: bool,
}

impl FeatureSupport {
    pub fn all_available(&self) -> bool {
        self.animation_frame && self.canvas_2d && self.event_listeners && self.prevent_default
    }
}

/// Probe the current browser
#[cfg(target_arch = "wasm32")]
pub fn probe() -> Option<FeatureSupport> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;

    let window = web_sys::window()?;
    let document = window.document()?;
    let has_fn = |target: &JsValue, name: &str| {
        js_sys::Reflect::get(target, &JsValue::from_str(name))
            .map(|v| v.is_function())
            .unwrap_or(false)
    };

    let animation_frame = has_fn(window.as_ref(), "requestAnimationFrame");
    let event_listeners = has_fn(window.as_ref(), "addEventListener");
    let canvas_2d = document
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .and_then(|canvas| canvas.get_context("2d").ok().flatten())
        .is_some();
    let prevent_default = web_sys::Event::new("test")
        .map(|event| has_fn(event.as_ref(), "preventDefault"))
        .unwrap_or(false);

    Some(FeatureSupport {
        animation_frame,
        canvas_2d,
        event_listeners,
        prevent_default,
    })
}

/// Native stub
#[cfg(not(target_arch = "wasm32"))]
pub fn probe() -> Option<FeatureSupport> {
    None
}

/// High resolution timestamp in milliseconds (`performance.now()`)
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn unix_time_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    unix_time_ms()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn unix_time_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Run `f` and return its result with the elapsed milliseconds
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = now_ms();
    let result = f();
    (result, (now_ms() - start).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn test_native_has_no_browser() {
        assert_eq!(probe(), None);
    }

    #[test]
    fn test_all_available() {
        let mut features = FeatureSupport {
            animation_frame: true,
            canvas_2d: true,
            event_listeners: true,
            prevent_default: true,
        };
        assert!(features.all_available());
        features.prevent_default = false;
        assert!(!features.all_available());
    }

    #[test]
    fn test_measure() {
        let (value, elapsed) = measure(|| 6 * 7);
        assert_eq!(value, 42);
        assert!(elapsed >= 0.0 && elapsed.is_finite());
        assert!(unix_time_ms() > 0.0);
    }
}
