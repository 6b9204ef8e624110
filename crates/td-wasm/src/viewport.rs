//! `ChartViewport` backed by the host chart's JS conversion functions.
//!
//! The host hands in an object with `timeToPixel`, `pixelToTime`,
//! `logicalToPixel`, `pixelToLogical`, `priceToPixel` and `pixelToPrice`.
//! Any of them may be missing, throw, or return `null`; all three read as
//! "unresolvable".

use js_sys::{Function, Reflect};
use td_core::ChartViewport;
use td_core::model::UnixTime;
use wasm_bindgen::{JsCast, JsValue};

pub struct JsViewport {
    target: JsValue,
}

impl JsViewport {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn call(&self, method: &str, arg: f64) -> Option<f64> {
        let f = Reflect::get(&self.target, &JsValue::from_str(method)).ok()?;
        let f = f.dyn_ref::<Function>()?;
        match f.call1(&self.target, &JsValue::from_f64(arg)) {
            Ok(v) => v.as_f64().filter(|v| v.is_finite()),
            Err(e) => {
                log::debug!("viewport.{method}({arg}) threw: {e:?}");
                None
            }
        }
    }
}

impl ChartViewport for JsViewport {
    fn time_to_pixel(&self, time: UnixTime) -> Option<f64> {
        self.call("timeToPixel", time as f64)
    }

    fn pixel_to_time(&self, x: f64) -> Option<UnixTime> {
        self.call("pixelToTime", x).map(|t| t.round() as UnixTime)
    }

    fn logical_to_pixel(&self, logical: f64) -> Option<f64> {
        self.call("logicalToPixel", logical)
    }

    fn pixel_to_logical(&self, x: f64) -> Option<f64> {
        self.call("pixelToLogical", x)
    }

    fn price_to_pixel(&self, price: f64) -> Option<f64> {
        self.call("priceToPixel", price)
    }

    fn pixel_to_price(&self, y: f64) -> Option<f64> {
        self.call("pixelToPrice", y)
    }
}
