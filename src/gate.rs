use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};

use crate::workflow::{GateInput, GateStep, WorkflowState, render_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Quit,
    Confirm,
}

/// Key bindings: `q`/Ctrl-C quit, `b` build, `r` run, Enter confirm.
pub fn map_key(key: KeyEvent) -> Option<GateInput> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(GateInput::Quit),
        (_, KeyCode::Char('q')) => Some(GateInput::Quit),
        (_, KeyCode::Char('b')) => Some(GateInput::ToggleBuild),
        (_, KeyCode::Char('r')) => Some(GateInput::ToggleRun),
        (_, KeyCode::Enter) => Some(GateInput::Confirm),
        _ => None,
    }
}

/// Raw mode plus alternate screen, undone on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, Hide).context("enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn draw(out: &mut impl Write, lines: &[String]) -> Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for line in lines {
        queue!(out, Print(line), Print("\r\n"))?;
    }
    out.flush()?;
    Ok(())
}

/// Show the status view until the user confirms or quits.
pub fn run_gate(state: &mut WorkflowState) -> Result<GateDecision> {
    let _terminal = TerminalGuard::enter()?;
    let mut stdout = io::stdout();

    loop {
        draw(&mut stdout, &render_status(state))?;

        let Event::Key(key) = event::read().context("read terminal input")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(input) = map_key(key) else {
            continue;
        };
        match state.apply(input) {
            GateStep::Continue => {}
            GateStep::Quit => return Ok(GateDecision::Quit),
            GateStep::Confirm => return Ok(GateDecision::Confirm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn bindings_map_to_inputs() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(GateInput::Quit));
        assert_eq!(map_key(key(KeyCode::Char('b'))), Some(GateInput::ToggleBuild));
        assert_eq!(map_key(key(KeyCode::Char('r'))), Some(GateInput::ToggleRun));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(GateInput::Confirm));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(GateInput::Quit)
        );
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
        assert_eq!(map_key(key(KeyCode::Char('c'))), None);
        assert_eq!(map_key(key(KeyCode::Esc)), None);
    }

    #[test]
    fn draw_writes_every_line() {
        let mut buffer = Vec::new();
        draw(&mut buffer, &["first".to_string(), "second".to_string()]).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert!(written.contains("first\r\nsecond\r\n"));
    }
}
