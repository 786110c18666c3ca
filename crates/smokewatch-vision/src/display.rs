//! Preview window implementations.

use std::marker::PhantomData;

use crate::error::VisionResult;
use crate::providers::Display;

/// Display that shows nothing and never reports a key.
///
/// Used when the preview window is disabled; the monitor then stops only on
/// capture failure or Ctrl-C.
pub struct HeadlessDisplay<F> {
    _frame: PhantomData<fn(&F)>,
}

impl<F> HeadlessDisplay<F> {
    pub fn new() -> Self {
        Self {
            _frame: PhantomData,
        }
    }
}

impl<F> Default for HeadlessDisplay<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Display<F> for HeadlessDisplay<F> {
    fn show(&mut self, _frame: &F) -> VisionResult<()> {
        Ok(())
    }

    fn poll_key(&mut self) -> VisionResult<Option<char>> {
        Ok(None)
    }

    fn close(&mut self) {}
}

#[cfg(feature = "opencv")]
pub use self::highgui_window::HighGuiDisplay;

#[cfg(feature = "opencv")]
mod highgui_window {
    use opencv::core::Mat;
    use opencv::highgui;
    use tracing::{debug, warn};

    use crate::error::{VisionError, VisionResult};
    use crate::providers::Display;

    /// OpenCV HighGUI preview window.
    ///
    /// All windows are destroyed on `close()` or when dropped.
    pub struct HighGuiDisplay {
        window: String,
        open: bool,
    }

    impl HighGuiDisplay {
        pub fn new(window: impl Into<String>) -> VisionResult<Self> {
            let window = window.into();
            highgui::named_window(&window, highgui::WINDOW_AUTOSIZE)
                .map_err(|e| VisionError::display(format!("named_window failed: {e}")))?;
            debug!("Opened preview window '{}'", window);
            Ok(Self { window, open: true })
        }
    }

    impl Display<Mat> for HighGuiDisplay {
        fn show(&mut self, frame: &Mat) -> VisionResult<()> {
            highgui::imshow(&self.window, frame)
                .map_err(|e| VisionError::display(format!("imshow failed: {e}")))
        }

        fn poll_key(&mut self) -> VisionResult<Option<char>> {
            let code = highgui::wait_key(1)
                .map_err(|e| VisionError::display(format!("wait_key failed: {e}")))?;
            if code < 0 {
                return Ok(None);
            }
            Ok(char::from_u32((code & 0xFF) as u32))
        }

        fn close(&mut self) {
            if !self.open {
                return;
            }
            self.open = false;
            if let Err(e) = highgui::destroy_all_windows() {
                warn!("Failed to close preview windows: {}", e);
            }
        }
    }

    impl Drop for HighGuiDisplay {
        fn drop(&mut self) {
            self.close();
        }
    }
}
