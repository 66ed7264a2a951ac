//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: model name, status and the "↓ New" hint
//! - `Message`: one chat turn
//! - `ErrorLine`: the inline error under the conversation
//! - `LandingPage`: greeting shown before the first question
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: prompt editor
//! - `MessageList`: scrollable conversation view with layout caching
//!
//! Components receive external data as "props" rather than reading `App`
//! directly, which keeps each one testable on a `TestBackend`:
//!
//! ```rust,ignore
//! TitleBar::new(app.model_name.clone(), app.status_message.clone(), unseen).render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── message.rs       (Single turn renderer)
//! ├── message_list.rs  (Scrollable turn container)
//! ├── error_line.rs    (Inline error)
//! ├── landing.rs       (Empty-state greeting)
//! └── input_box/       (Prompt editor)
//! ```

pub mod error_line;
pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;
mod title_bar;

pub use error_line::ErrorLine;
pub use input_box::{InputBox, InputEvent};
pub use landing::LandingPage;
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
