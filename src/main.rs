use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use tracing::{error, info, warn};

use type2learn::app::{App, Focus, GenerateField};
use type2learn::config::{Config, GeneratorKind};
use type2learn::event::{AppEvent, EventHandler};
use type2learn::gateway::SnippetGenerator;
use type2learn::gateway::client::{DirectGenerator, ProxyClient};
use type2learn::gateway::gemini::HttpUpstream;
use type2learn::gateway::proxy::Proxy;
use type2learn::logging;
use type2learn::session::buffer::Edit;
use type2learn::snippet::store::SnippetStore;
use type2learn::ui::components::code_editor::CodeEditor;
use type2learn::ui::components::history_list::HistoryList;
use type2learn::ui::components::snippet_panel::SnippetPanel;
use type2learn::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use type2learn::ui::line_input::InputResult;
use type2learn::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "type2learn", version, about = "Learn code syntax by typing it")]
struct Cli {
    #[arg(short, long, global = true, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, global = true, help = "Config file (default: platform config dir)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Generate endpoint of a running proxy")]
    proxy_url: Option<String>,

    #[arg(long, help = "Call the model directly using GEMINI_API_KEY")]
    direct: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Practice typing snippets (default)
    Practice,
    /// Run the generation proxy
    Serve {
        #[arg(short, long, help = "Listen address, e.g. 127.0.0.1:8787")]
        bind: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(url) = cli.proxy_url {
        config.proxy_url = url;
    }
    if cli.direct {
        config.generator = "direct".to_string();
    }
    config.validate();

    match cli.command {
        Some(Command::Serve { bind }) => {
            logging::init_stderr_logging();
            let bind = bind.unwrap_or_else(|| config.bind_address.clone());
            run_serve(&config, &bind)
        }
        Some(Command::Practice) | None => {
            logging::init_file_logging();
            run_practice(config)
        }
    }
}

fn direct_proxy(config: &Config) -> Result<Proxy> {
    let upstream = HttpUpstream::new(config.request_timeout())?;
    Ok(Proxy::from_env(
        &config.model,
        &config.api_base_url,
        Box::new(upstream),
    ))
}

#[cfg(feature = "network")]
fn run_serve(config: &Config, bind: &str) -> Result<()> {
    let proxy = direct_proxy(config)?;
    type2learn::gateway::server::serve(bind, &proxy)
}

#[cfg(not(feature = "network"))]
fn run_serve(_config: &Config, _bind: &str) -> Result<()> {
    anyhow::bail!("built without network support")
}

fn build_generator(config: &Config) -> Result<Arc<dyn SnippetGenerator>> {
    let generator: Arc<dyn SnippetGenerator> = match config.generator_kind() {
        GeneratorKind::Proxy => {
            info!(url = %config.proxy_url, "generating through proxy");
            Arc::new(ProxyClient::new(&config.proxy_url, config.request_timeout())?)
        }
        GeneratorKind::Direct => {
            let proxy = direct_proxy(config)?;
            info!(endpoint = %proxy.model_endpoint(), "generating directly");
            Arc::new(DirectGenerator::new(proxy))
        }
    };
    Ok(generator)
}

fn run_practice(config: Config) -> Result<()> {
    let store = SnippetStore::load(config.snippets_file.as_deref())?;
    let generator = build_generator(&config)?;
    let loaded_theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(
            theme = %config.theme,
            available = ?Theme::available_themes(),
            "unknown theme, using default"
        );
        Theme::default()
    });
    let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
    info!(snippets = store.len(), theme = %theme.name, "starting practice");

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(config, theme, store, generator, events.sender());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(error = ?err, "event loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Paste(text) => handle_paste(app, &text),
            AppEvent::Generated { request, result } => {
                app.on_generated(request, result, Instant::now());
            }
            // Redraw picks up cooldown expiry and new sizes.
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Repeats are real input when a key is held; releases are not.
    if key.kind == KeyEventKind::Release {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('n') => {
                app.next_snippet();
                return;
            }
            KeyCode::Char('p') => {
                app.previous_snippet();
                return;
            }
            KeyCode::Char('g') => {
                app.open_generate_form();
                return;
            }
            KeyCode::Char('r') => {
                app.open_history();
                return;
            }
            _ => {}
        }
    }

    match app.focus {
        Focus::Editor => handle_editor_key(app, key),
        Focus::History => handle_history_key(app, key),
        Focus::Generate => handle_generate_key(app, key),
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    let edit = match key.code {
        KeyCode::Esc => {
            app.return_to_practice();
            return;
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => Edit::Insert(ch),
        KeyCode::Enter => Edit::Newline,
        KeyCode::Tab => Edit::Indent,
        KeyCode::Backspace => Edit::Backspace,
        KeyCode::Delete => Edit::Delete,
        KeyCode::Left => Edit::Left,
        KeyCode::Right => Edit::Right,
        KeyCode::Up => Edit::Up,
        KeyCode::Down => Edit::Down,
        KeyCode::Home => Edit::Home,
        KeyCode::End => Edit::End,
        _ => return,
    };
    app.edit(edit);
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.focus = Focus::Editor,
        KeyCode::Up | KeyCode::Char('k') => app.history_move(false),
        KeyCode::Down | KeyCode::Char('j') => app.history_move(true),
        KeyCode::Enter => {
            app.view_selected_history();
        }
        _ => {}
    }
}

fn handle_generate_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.generate_field = match app.generate_field {
                GenerateField::Language => GenerateField::Topic,
                GenerateField::Topic => GenerateField::Language,
            };
            return;
        }
        KeyCode::Up | KeyCode::Down => {
            app.generate_field = if key.code == KeyCode::Up {
                GenerateField::Language
            } else {
                GenerateField::Topic
            };
            return;
        }
        _ => {}
    }

    match app.generate_field {
        GenerateField::Language => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.cycle_language(false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => app.cycle_language(true),
            KeyCode::Enter => {
                app.submit_generation(Instant::now());
            }
            KeyCode::Esc => app.focus = Focus::Editor,
            _ => {}
        },
        GenerateField::Topic => match app.topic.handle(key) {
            InputResult::Submit => {
                app.submit_generation(Instant::now());
            }
            InputResult::Cancel => app.focus = Focus::Editor,
            InputResult::Continue => {}
        },
    }
}

fn handle_paste(app: &mut App, text: &str) {
    match app.focus {
        Focus::Editor => app.edit(Edit::Paste(text.to_string())),
        Focus::Generate if app.generate_field == GenerateField::Topic => app.topic.paste(text),
        _ => {}
    }
}

fn footer_hints(app: &App) -> Vec<&'static str> {
    match app.focus {
        Focus::Editor if app.is_reviewing() => vec![
            "[Esc] Back to practice",
            "[^R] History",
            "[^G] Generate",
            "[^Q] Quit",
        ],
        Focus::Editor => vec![
            "[^N] Next",
            "[^P] Previous",
            "[^R] History",
            "[^G] Generate",
            "[Tab] Indent",
            "[^Q] Quit",
        ],
        Focus::History => vec!["[j/k] Move", "[Enter] View", "[Esc] Close"],
        Focus::Generate => vec![
            "[Tab] Field",
            "[←/→] Language",
            "[Enter] Generate",
            "[Esc] Close",
        ],
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    let hints = footer_hints(app);
    let hint_lines = pack_hint_lines(&hints, area.width as usize);
    let layout = AppLayout::new(area, hint_lines.len() as u16);

    render_header(frame, app, layout.header);

    if let Some(history_area) = layout.history {
        frame.render_widget(
            HistoryList::new(
                &app.practice,
                app.history_selected,
                app.focus == Focus::History,
                app.theme,
            ),
            history_area,
        );
    }

    let snippet = app.practice.active_snippet();
    frame.render_widget(
        CodeEditor::new(
            app.practice.session(),
            snippet.language(),
            snippet.title(),
            app.focus == Focus::Editor,
            app.theme,
        ),
        layout.editor,
    );
    frame.render_widget(SnippetPanel::new(app), layout.panel);

    let footer: Vec<Line> = hint_lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending()))))
        .collect();
    frame.render_widget(Paragraph::new(footer), layout.footer);

    // Without a sidebar, history opens as a popup.
    if layout.history.is_none() && app.focus == Focus::History {
        let popup = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            HistoryList::new(&app.practice, app.history_selected, true, app.theme),
            popup,
        );
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    let nav = app.practice.navigator();
    let position = format!(
        " snippet {}/{} ",
        nav.active() + 1,
        app.practice.store().len()
    );
    let mode = if app.is_reviewing() { "reviewing" } else { "practice" };

    let mut spans = vec![
        Span::styled(
            " Type2Learn ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.accent())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(position, Style::default().fg(colors.header_fg())),
        Span::styled(format!("· {mode} "), Style::default().fg(colors.text_pending())),
    ];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!(" {notice} "),
            Style::default().fg(colors.success()).add_modifier(Modifier::BOLD),
        ));
    }
    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}
