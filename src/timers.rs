use heart_core::SourceKind;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// `setInterval` registration that is cleared when dropped, so replacing or
/// dropping a producer can never leave its writer running.
pub struct Interval {
    id: i32,
    label: &'static str,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(
        label: &'static str,
        period_ms: i32,
        callback: impl FnMut() + 'static,
    ) -> anyhow::Result<Self> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                period_ms,
            )
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        log::debug!("[timer] {} every {} ms", label, period_ms);
        Ok(Self {
            id,
            label,
            _callback: callback,
        })
    }

    /// Timer at `source`'s declared cadence. Per-frame sources have none.
    pub fn for_source(
        source: SourceKind,
        callback: impl FnMut() + 'static,
    ) -> anyhow::Result<Self> {
        let period = source
            .cadence()
            .interval_ms()
            .ok_or_else(|| anyhow::anyhow!("{} is pulled per frame", source))?;
        Self::new(source.label(), period as i32, callback)
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(w) = web::window() {
            w.clear_interval_with_handle(self.id);
        }
        log::debug!("[timer] {} cleared", self.label);
    }
}
