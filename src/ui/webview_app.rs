//! WebView shell using `wry` + `tao`.
//!
//! Architecture:
//! - One window with one shared webview; tabs are logical surfaces that
//!   swap their url into the webview on activation. The session controller
//!   treats them as opaque handles behind the `Surface` seam.
//! - Page-load, title, and navigation callbacks are tagged with the current
//!   tab id and forwarded into the controller as `SurfaceEvent`s through
//!   the event-loop proxy.
//! - Keyboard shortcuts are injected via `with_initialization_script` and
//!   reach Rust through `window.ipc.postMessage()`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tao::event::{Event, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tao::window::WindowBuilder;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wry::{PageLoadEvent, WebView, WebViewBuilder};

use crate::app::App;
use crate::managers::session_controller::{
    SessionController, SessionTuning, Surface, SurfaceHost, TabEventSink,
};
use crate::types::errors::SurfaceError;
use crate::types::tab::{SurfaceEvent, BLANK_PAGE_URL};

/// Sentinel meaning "no tab is foreground yet".
const NO_TAB: u64 = u64::MAX;

const FAILURE_PAGE_URL: &str =
    "data:text/html,<h1>Failed to load page</h1><p>Please check your internet connection.</p>";

/// Ctrl+T / Ctrl+W / Ctrl+Tab forwarded to Rust as IPC commands.
const SHORTCUT_JS: &str = r#"
window.addEventListener('keydown', function (e) {
  if (!e.ctrlKey) return;
  var cmd = null;
  if (e.key === 't' || e.key === 'T') cmd = 'new_tab';
  else if (e.key === 'w' || e.key === 'W') cmd = 'close_tab';
  else if (e.key === 'Tab') cmd = 'next_tab';
  if (cmd && window.ipc) {
    e.preventDefault();
    window.ipc.postMessage(JSON.stringify({ cmd: cmd }));
  }
});
"#;

#[derive(Debug)]
enum ShellEvent {
    Surface { tab_id: u64, event: SurfaceEvent },
    Command(String),
}

fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        BLANK_PAGE_URL.to_string()
    } else {
        url.to_string()
    }
}

/// Logical surface backed by the shared webview.
struct WrySurface {
    tab_id: u64,
    webview: Rc<WebView>,
    current: Arc<AtomicU64>,
    urls: Rc<RefCell<HashMap<u64, String>>>,
    destroyed: bool,
}

impl WrySurface {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::Relaxed) == self.tab_id
    }
}

impl Surface for WrySurface {
    fn navigate(&mut self, url: &str) {
        let url = normalize_url(url);
        self.urls.borrow_mut().insert(self.tab_id, url.clone());
        if self.is_current() {
            let _ = self.webview.load_url(&url);
        }
    }

    fn reload(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        if self.is_current() {
            let _ = self.webview.evaluate_script("window.location.reload()");
        }
        // A background tab reloads naturally on its next activation.
        true
    }

    fn show_failure_page(&mut self) {
        if self.is_current() {
            let _ = self.webview.load_url(FAILURE_PAGE_URL);
        }
    }

    fn activate(&mut self) {
        self.current.store(self.tab_id, Ordering::Relaxed);
        let url = self
            .urls
            .borrow()
            .get(&self.tab_id)
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE_URL.to_string());
        let _ = self.webview.load_url(&url);
    }

    fn destroy(&mut self) {
        self.urls.borrow_mut().remove(&self.tab_id);
        self.destroyed = true;
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

struct WryHost {
    webview: Rc<WebView>,
    current: Arc<AtomicU64>,
    urls: Rc<RefCell<HashMap<u64, String>>>,
}

impl SurfaceHost for WryHost {
    type Surface = WrySurface;

    fn create_surface(&mut self, tab_id: u64, url: &str) -> Result<WrySurface, SurfaceError> {
        self.urls.borrow_mut().insert(tab_id, normalize_url(url));
        Ok(WrySurface {
            tab_id,
            webview: self.webview.clone(),
            current: self.current.clone(),
            urls: self.urls.clone(),
            destroyed: false,
        })
    }
}

/// Relay endpoint for the shell; window-title updates are handled in the
/// event loop before events reach the controller.
struct ShellSink;

impl TabEventSink for ShellSink {
    fn surface_event(&mut self, tab_id: u64, event: &SurfaceEvent) {
        debug!(tab_id, ?event, "surface event");
    }

    fn tab_restored(&mut self, tab_id: u64, url: &str, title: &str) {
        info!(tab_id, url, title, "tab restored");
    }
}

/// Runs the webview shell until the window closes.
pub fn run() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();

    let start_hidden = std::env::args().any(|arg| arg == "--hidden");

    let mut app = App::new();
    if !app.startup() {
        info!("another browser instance is running, exiting");
        return;
    }
    let store = app.snapshot_store();
    let settings = app.settings_engine.get_settings();
    let tuning = SessionTuning::from_settings(&settings.general, &settings.session);

    let event_loop: EventLoop<ShellEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title("Havenbrowser")
        .with_inner_size(tao::dpi::LogicalSize::new(1280.0, 800.0))
        .with_visible(!start_hidden)
        .build(&event_loop)
        .expect("Failed to create window");

    let current = Arc::new(AtomicU64::new(NO_TAB));

    let ipc_proxy = proxy.clone();
    let pl_proxy = proxy.clone();
    let pl_current = current.clone();
    let title_proxy = proxy.clone();
    let title_current = current.clone();

    let webview = WebViewBuilder::new()
        .with_url(BLANK_PAGE_URL)
        .with_initialization_script(SHORTCUT_JS)
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(msg.body()) {
                if let Some(cmd) = value.get("cmd").and_then(|v| v.as_str()) {
                    let _ = ipc_proxy.send_event(ShellEvent::Command(cmd.to_string()));
                }
            }
        })
        .with_on_page_load_handler(move |load_event, url| {
            let tab_id = pl_current.load(Ordering::Relaxed);
            match load_event {
                PageLoadEvent::Started => {
                    let _ = pl_proxy.send_event(ShellEvent::Surface {
                        tab_id,
                        event: SurfaceEvent::LoadStarted,
                    });
                }
                PageLoadEvent::Finished => {
                    let _ = pl_proxy.send_event(ShellEvent::Surface {
                        tab_id,
                        event: SurfaceEvent::UrlChanged(url),
                    });
                    let _ = pl_proxy.send_event(ShellEvent::Surface {
                        tab_id,
                        event: SurfaceEvent::LoadStopped,
                    });
                }
            }
        })
        .with_document_title_changed_handler(move |title| {
            let tab_id = title_current.load(Ordering::Relaxed);
            let _ = title_proxy.send_event(ShellEvent::Surface {
                tab_id,
                event: SurfaceEvent::TitleChanged(title),
            });
        })
        .build(&window)
        .expect("Failed to create WebView");
    let webview = Rc::new(webview);

    let urls = Rc::new(RefCell::new(HashMap::new()));
    let host = WryHost {
        webview,
        current: current.clone(),
        urls: urls.clone(),
    };
    let mut controller = SessionController::new(host, ShellSink, store, tuning);
    if let Err(e) = controller.start_session(Instant::now()) {
        info!("could not open the initial tab: {}", e);
    }

    // SIGINT/SIGTERM take the same shutdown path as closing the window.
    let signal_proxy = proxy.clone();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_io().build() {
            Ok(runtime) => runtime,
            Err(_) => return,
        };
        runtime.block_on(shutdown_signal());
        let _ = signal_proxy.send_event(ShellEvent::Command("quit".to_string()));
    });

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + Duration::from_millis(250));

        match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                controller.poll_timers(Instant::now());
            }
            Event::UserEvent(ShellEvent::Surface { tab_id, event }) => {
                if let SurfaceEvent::UrlChanged(url) = &event {
                    urls.borrow_mut().insert(tab_id, url.clone());
                }
                if let SurfaceEvent::TitleChanged(title) = &event {
                    if current.load(Ordering::Relaxed) == tab_id {
                        window.set_title(&format!("{} — Havenbrowser", title));
                    }
                }
                controller.handle_surface_event(tab_id, event, Instant::now());
            }
            Event::UserEvent(ShellEvent::Command(cmd)) => {
                if cmd == "quit" {
                    controller.teardown();
                    app.shutdown();
                    *control_flow = ControlFlow::Exit;
                } else {
                    handle_command(&mut controller, &cmd);
                }
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                controller.teardown();
                app.shutdown();
                *control_flow = ControlFlow::Exit;
            }
            _ => {}
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(_) => {
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

fn handle_command(controller: &mut SessionController<WryHost, ShellSink>, cmd: &str) {
    match cmd {
        "new_tab" => {
            if let Ok(id) = controller.create_tab("") {
                controller.switch_to(id);
            }
        }
        "close_tab" => {
            if let Some(cur) = controller.current_tab_id() {
                let _ = controller.close_tab(cur);
            }
        }
        "next_tab" => {
            let ids: Vec<u64> = controller.tab_states().iter().map(|t| t.id).collect();
            if ids.len() < 2 {
                return;
            }
            let cur = controller.current_tab_id();
            let pos = cur.and_then(|c| ids.iter().position(|id| *id == c)).unwrap_or(0);
            let next = ids[(pos + 1) % ids.len()];
            controller.switch_to(next);
        }
        other => debug!(cmd = other, "ignoring unknown shell command"),
    }
}
