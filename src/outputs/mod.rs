//! Output generation for the rendered widget.
//!
//! # Submodules
//!
//! - [`html`]: reads the host page and writes the rendered page back out
//!
//! # Output Structure
//!
//! ```text
//! output.html   # host page with the widget container filled in
//! ```

pub mod html;
