//! The playground application: page controller, frame process, event loop.
//!
//! The controller owns the session and talks to the session API; the event
//! loop owns the terminal. They meet on the event buses: the UI emits run
//! and save signals, subscriptions park them in an action queue, and the
//! loop executes queued actions between input and paint. Frame output
//! arrives as transport envelopes on the frame process's stdout; the host
//! drops any envelope not addressed to its own origin before the receiver
//! sees it.

use std::io::BufRead;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::api::SessionApi;
use crate::config::Config;
use crate::constants::FRAME_TICK_MS;
use crate::events::{EventBus, Subscription};
use crate::relay::protocol::MessageEvent;
use crate::relay::{ConsoleMessage, ConsoleReceiver};
use crate::scheduler::{QueuedDriver, Scheduler};
use crate::session::{templates, FileKind, Session};
use crate::tui::console_view::ConsoleView;
use crate::tui::editor::{EditorPane, TextEditor};
use crate::tui::frame_view::FrameView;
use crate::tui::split::{PaneId, SplitEngine, SplitId};

/// The application's pub/sub channels, one per logical signal.
#[derive(Default)]
pub struct Buses {
    pub resize: EventBus<()>,
    pub run: EventBus<()>,
    pub save: EventBus<()>,
    pub console: EventBus<ConsoleMessage>,
}

impl Buses {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Owns the session and drives the session API.
///
/// Deliberately terminal-free so the session lifecycle can be exercised
/// without a TTY.
pub struct PageController {
    api: SessionApi,
    session: Session,
    session_id: Option<String>,
}

impl PageController {
    pub fn new(api: SessionApi) -> Self {
        Self {
            api,
            session: templates::create(),
            session_id: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Registers the session with the API and remembers its id.
    pub async fn create(&mut self) -> anyhow::Result<&str> {
        let id = self
            .api
            .create_session(&self.session)
            .await
            .context("failed to create a session")?;
        Ok(self.session_id.insert(id).as_str())
    }

    /// Editor-change path: replaces one file's contents, versions untouched.
    pub fn on_editor_change(&mut self, kind: FileKind, contents: &str) {
        self.session = self.session.with_contents(kind, contents);
    }

    /// Pushes the current session to the API so the next page load serves
    /// the editors' contents, not what they started from.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let id = match self.session_id.clone() {
            Some(id) => id,
            None => self.create().await?.to_string(),
        };
        self.api
            .update_session(&id, &self.session)
            .await
            .context("failed to update the session")?;
        Ok(())
    }

    /// Persists the current session; the returned id survives restarts.
    pub async fn save(&mut self) -> anyhow::Result<String> {
        self.run().await?;
        let save_id = self
            .api
            .save(&self.session)
            .await
            .context("failed to save the session")?;
        Ok(save_id)
    }

    /// Loads a save and merges it over the local draft. The merge bumps
    /// every file version, which is what makes the editors adopt the
    /// restored contents.
    pub async fn restore_saved(&mut self, save_id: &str) -> anyhow::Result<()> {
        let loaded = self
            .api
            .get_saved(save_id)
            .await
            .with_context(|| format!("failed to load save {save_id:?}"))?;
        self.session = Session::merge(&loaded, &self.session);
        Ok(())
    }
}

/// Routes one line of frame-process stdout.
///
/// The transport-level check: envelopes not addressed to this host's origin
/// are dropped before any payload validation runs.
pub fn dispatch_frame_line(line: &str, main_origin: &str, receiver: &ConsoleReceiver) {
    let event: MessageEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            log::warn!("undeliverable frame output: {err}");
            return;
        }
    };
    if event.target != main_origin {
        log::debug!(
            "dropping envelope addressed to {:?} (this host is {:?})",
            event.target,
            main_origin
        );
        return;
    }
    receiver.on_message(&event);
}

/// Argv for the content-frame process. An empty configured command means
/// "this executable, `frame` subcommand"; otherwise `{url}` placeholders
/// are substituted, or `--url` is appended when there are none.
fn frame_argv(command: &[String], page_url: &str) -> anyhow::Result<Vec<String>> {
    if command.is_empty() {
        let exe = std::env::current_exe().context("failed to locate the ject executable")?;
        return Ok(vec![
            exe.to_string_lossy().into_owned(),
            "frame".to_string(),
            "--url".to_string(),
            page_url.to_string(),
        ]);
    }

    let mut argv: Vec<String> = command
        .iter()
        .map(|part| part.replace("{url}", page_url))
        .collect();
    if !command.iter().any(|part| part.contains("{url}")) {
        argv.push("--url".to_string());
        argv.push(page_url.to_string());
    }
    Ok(argv)
}

/// The spawned content-frame process. Its stdout lines are forwarded to the
/// event loop over a channel; dropping the handle kills the child.
struct FrameProcess {
    child: Child,
}

impl FrameProcess {
    fn spawn(command: &[String], page_url: &str, lines: Sender<String>) -> anyhow::Result<Self> {
        let argv = frame_argv(command, page_url)?;
        log::info!("spawning content frame: {argv:?}");

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn the content frame {:?}", argv[0]))?;

        let stdout = child
            .stdout
            .take()
            .context("content frame has no stdout")?;
        std::thread::spawn(move || {
            for line in std::io::BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if lines.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self { child })
    }
}

impl Drop for FrameProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Run,
    Save,
}

struct App {
    config: Config,
    runtime: tokio::runtime::Runtime,
    controller: PageController,
    buses: Buses,
    receiver: ConsoleReceiver,
    main_origin: String,

    editors: [Box<dyn EditorPane>; 3],
    focus: usize,
    split: SplitEngine,
    console: ConsoleView,
    frame_view: FrameView,
    driver: Arc<QueuedDriver>,

    frame: Option<FrameProcess>,
    frame_lines: Receiver<String>,
    frame_tx: Sender<String>,
    frame_origin: String,

    actions: Arc<Mutex<Vec<Action>>>,
    _subscriptions: Vec<Subscription>,

    workspace: Rect,
    menu_open: bool,
    status: String,
    quit: bool,
}

/// Runs the playground TUI until the user quits.
pub fn run(config: &Config, saved: Option<&str>) -> anyhow::Result<()> {
    let mut app = App::new(config.clone(), saved)?;

    let mut terminal = ratatui::init();
    let _ = execute!(std::io::stdout(), EnableMouseCapture);
    let result = app.event_loop(&mut terminal);
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

impl App {
    fn new(config: Config, saved: Option<&str>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let main_origin = config.main_origin()?;
        let frame_origin = config.frame_origin()?;

        let mut controller = PageController::new(SessionApi::new(config.api_base_url.clone()));
        // Session creation failing leaves the editors usable; the next run
        // retries it.
        let mut status = match runtime.block_on(controller.create()) {
            Ok(id) => format!("session {id}"),
            Err(err) => {
                log::error!("{err:#}");
                "failed to create session".to_string()
            }
        };
        if let Some(save_id) = saved {
            if let Err(err) = runtime.block_on(controller.restore_saved(save_id)) {
                log::error!("{err:#}");
                status = format!("failed to restore {save_id}");
            }
        }

        let buses = Buses::new();
        let receiver = ConsoleReceiver::new(frame_origin.clone(), buses.console.clone());
        let console = ConsoleView::new(&buses.console);

        let driver = Arc::new(QueuedDriver::new());
        let scheduler = Scheduler::new(driver.clone());
        let page_url = controller
            .session_id()
            .map(|id| format!("{frame_origin}/api/session/{id}/page"));
        let frame_view = FrameView::new(scheduler, page_url.clone().unwrap_or_default());

        let actions: Arc<Mutex<Vec<Action>>> = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Vec::new();
        subscriptions.push(frame_view.subscribe_resize(&buses.resize));
        for (bus, action) in [(&buses.run, Action::Run), (&buses.save, Action::Save)] {
            let actions = Arc::clone(&actions);
            subscriptions.push(bus.subscribe(move |(): &()| {
                actions.lock().expect("action queue").push(action);
            }));
        }

        let mut editors: [Box<dyn EditorPane>; 3] = [
            Box::new(TextEditor::new(FileKind::Html)),
            Box::new(TextEditor::new(FileKind::JavaScript)),
            Box::new(TextEditor::new(FileKind::Css)),
        ];
        for editor in &mut editors {
            if let Some(file) = controller.session().file(editor.kind()) {
                editor.reconcile(file);
            }
        }

        let (frame_tx, frame_lines) = mpsc::channel();
        let frame = page_url.as_deref().and_then(|url| {
            FrameProcess::spawn(&config.frame_command, url, frame_tx.clone())
                .map_err(|err| log::error!("content frame unavailable: {err:#}"))
                .ok()
        });

        Ok(Self {
            config,
            runtime,
            controller,
            buses,
            receiver,
            main_origin,
            editors,
            focus: 0,
            split: SplitEngine::new(),
            console,
            frame_view,
            driver,
            frame,
            frame_lines,
            frame_tx,
            frame_origin,
            actions,
            _subscriptions: subscriptions,
            workspace: Rect::default(),
            menu_open: false,
            status,
            quit: false,
        })
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(FRAME_TICK_MS);
        let mut last_tick = Instant::now();

        while !self.quit {
            terminal.draw(|frame| self.draw(frame))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
                    Event::Mouse(mouse) => self.on_mouse(mouse),
                    Event::Resize(_, _) => self.buses.resize.emit(&()),
                    _ => {}
                }
            }

            while let Ok(line) = self.frame_lines.try_recv() {
                dispatch_frame_line(&line, &self.main_origin, &self.receiver);
            }

            self.execute_actions();

            // Measures run every loop turn; renders wait for the frame tick.
            self.driver.run_measures();
            if last_tick.elapsed() >= tick_rate {
                if self.split.take_resize_queued() {
                    self.buses.resize.emit(&());
                }
                self.driver.run_renders();
                self.console.on_frame();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn execute_actions(&mut self) {
        let actions: Vec<Action> =
            std::mem::take(&mut *self.actions.lock().expect("action queue"));
        for action in actions {
            match action {
                Action::Run => match self.runtime.block_on(self.controller.run()) {
                    Ok(()) => {
                        self.reload_frame();
                        self.status = "running".to_string();
                    }
                    Err(err) => {
                        log::error!("run failed: {err:#}");
                        self.status = format!("run failed: {err}");
                    }
                },
                Action::Save => match self.runtime.block_on(self.controller.save()) {
                    Ok(save_id) => {
                        self.status = format!("saved as {save_id}");
                    }
                    Err(err) => {
                        log::error!("save failed: {err:#}");
                        self.status = format!("save failed: {err}");
                    }
                },
            }
        }
    }

    fn page_url(&self) -> Option<String> {
        self.controller
            .session_id()
            .map(|id| format!("{}/api/session/{id}/page", self.frame_origin))
    }

    /// Replaces the content-frame process, which reloads the page.
    fn reload_frame(&mut self) {
        let Some(url) = self.page_url() else {
            self.status = "no session yet".to_string();
            return;
        };
        self.frame_view.set_page_url(url.clone());
        self.frame = None;
        match FrameProcess::spawn(&self.config.frame_command, &url, self.frame_tx.clone()) {
            Ok(frame) => self.frame = Some(frame),
            Err(err) => {
                log::error!("failed to reload the content frame: {err:#}");
                self.status = "content frame unavailable".to_string();
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => self.quit = true,
                KeyCode::Enter => self.buses.run.emit(&()),
                KeyCode::Char('s') => self.buses.save.emit(&()),
                KeyCode::Char('l') => self.console.clear(),
                _ => {}
            }
            return;
        }
        if key.code == KeyCode::Tab {
            self.focus = (self.focus + 1) % self.editors.len();
            return;
        }

        let editor = &mut self.editors[self.focus];
        if editor.handle_key(key) {
            let kind = editor.kind();
            let contents = editor.contents();
            self.controller.on_editor_change(kind, &contents);
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        let layout = self.split.layout(self.workspace);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.menu_open {
                    self.menu_open = false;
                    let menu = self.menu_rect();
                    if contains(menu, mouse.column, mouse.row) {
                        match mouse.row.saturating_sub(menu.y + 1) {
                            0 => self.buses.run.emit(&()),
                            1 => self.buses.save.emit(&()),
                            _ => {}
                        }
                        return;
                    }
                }

                let center = self.split.virtual_center(self.workspace);
                if (mouse.column, mouse.row) == center {
                    self.menu_open = true;
                    return;
                }

                match layout.hit_test(mouse.column, mouse.row) {
                    Some(SplitId::X) => {
                        self.split
                            .press(SplitId::X, mouse.column, self.workspace.width);
                    }
                    Some(id @ (SplitId::Y1 | SplitId::Y2)) => {
                        self.split.press(id, mouse.row, self.workspace.height);
                    }
                    None => {}
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.split.dragging() {
                Some(SplitId::X) => self.split.motion(mouse.column),
                Some(SplitId::Y1 | SplitId::Y2) => self.split.motion(mouse.row),
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => self.split.release(),
            _ => {}
        }
    }

    /// Small command overlay anchored at the point where the dividers meet.
    fn menu_rect(&self) -> Rect {
        let (col, row) = self.split.virtual_center(self.workspace);
        let width = 18;
        let height = 4;
        let x = col.saturating_sub(width / 2).min(
            self.workspace
                .width
                .saturating_sub(width)
                .max(self.workspace.x),
        );
        let y = row
            .saturating_sub(height / 2)
            .min(self.workspace.height.saturating_sub(height));
        Rect::new(x, y, width, height)
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let status_height = 1;
        self.workspace = Rect::new(
            area.x,
            area.y,
            area.width,
            area.height.saturating_sub(status_height),
        );
        let layout = self.split.layout(self.workspace);

        for (index, editor) in self.editors.iter_mut().enumerate() {
            let pane = match editor.kind() {
                FileKind::Html => PaneId::TopLeft,
                FileKind::JavaScript => PaneId::TopRight,
                FileKind::Css => PaneId::BottomLeft,
            };
            editor.render(frame, layout.pane(pane), index == self.focus);
        }

        // Bottom right: the page above, the console log below.
        let pane = layout.pane(PaneId::BottomRight);
        let console_height = (pane.height / 3).max(3).min(pane.height);
        let page_area = Rect::new(
            pane.x,
            pane.y,
            pane.width,
            pane.height - console_height,
        );
        let console_area = Rect::new(
            pane.x,
            pane.y + page_area.height,
            pane.width,
            console_height,
        );
        self.frame_view.render(frame, page_area);
        self.console.render(frame, console_area);

        fill(frame, layout.x_divider, "│");
        fill(frame, layout.y1_divider, "─");
        fill(frame, layout.y2_divider, "─");

        if self.menu_open {
            let menu = self.menu_rect();
            frame.render_widget(Clear, menu);
            let body = Paragraph::new(vec![
                Line::raw("run    ctrl+enter"),
                Line::raw("save   ctrl+s"),
            ])
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, menu);
        }

        let status_text = if self.frame.is_some() {
            self.status.clone()
        } else {
            format!("{} | frame offline", self.status)
        };
        let status = Paragraph::new(Line::raw(status_text))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(
            status,
            Rect::new(area.x, area.y + self.workspace.height, area.width, 1),
        );
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x + rect.width
        && row >= rect.y
        && row < rect.y + rect.height
}

/// Paints every cell of `rect` with `symbol`.
fn fill(frame: &mut Frame<'_>, rect: Rect, symbol: &str) {
    let line = symbol.repeat(rect.width as usize);
    let lines: Vec<Line<'_>> = (0..rect.height).map(|_| Line::raw(line.clone())).collect();
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(Color::DarkGray)),
        rect,
    );
}
