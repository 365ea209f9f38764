use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use model_dashboard::{DashboardConfig, ModelApi, Session};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;

use crate::ui::screens::{Action, Route, Screen};

const FRAME_TICK: Duration = Duration::from_millis(120);

/// How long quitting waits for requests still on the blocking pool.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Runs the dashboard against the serving process in `config`, opening `start`.
///
/// # Errors
/// Returns an error if the runtime, terminal setup or rendering fails.
pub fn run(config: DashboardConfig, start: Route) -> Result<()> {
    let runtime = Runtime::new()?;

    let result = {
        let _enter = runtime.enter();
        shell(Session::new(ModelApi::new(config)), start)
    };

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn shell(mut session: Session, start: Route) -> Result<()> {
    // Metadata belongs to the shell, not to a view: it survives navigation.
    let shell_scope = session.mount();
    let _ = session.load_metadata(&shell_scope);

    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut screen = Screen::mount(start, &session);

    loop {
        session.tick();
        terminal.draw(|f| screen.draw(f, &session))?;

        if event::poll(FRAME_TICK)? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match screen.handle_key(k.code, &mut session) {
                    Action::Quit => break,
                    Action::Navigate(route) => screen = Screen::mount(route, &session),
                    Action::None => {}
                }
            }
        }
    }

    terminal.show_cursor()?;
    Ok(())
}
