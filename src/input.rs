use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use glyphfield::Macro;
use std::time::Duration;

const MACRO_STEP: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    NextPalette,
    RandomizeMacros,
    ResetMacros,
    SelectMacro(Macro),
    NudgeMacro(f32),
    ToggleHud,
    ToggleInertia,
    PointerDown(f32, f32),
    PointerMove(f32, f32),
    PointerUp(f32, f32),
    PointerLeave,
    Resize(u16, u16),
}

/// Waits up to `timeout` for the first event, then drains whatever else is queued.
pub(crate) fn collect_input(timeout: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();
    if !event::poll(timeout)? {
        return Ok(out);
    }
    out.push(event::read()?);
    while out.len() < 64 && event::poll(Duration::ZERO)? {
        out.push(event::read()?);
    }
    Ok(out)
}

pub(crate) fn map_event(ev: Event) -> Option<Action> {
    match ev {
        Event::Key(k) => map_key(k),
        Event::Mouse(m) => map_mouse(m),
        Event::FocusLost => Some(Action::PointerLeave),
        Event::Resize(w, h) => Some(Action::Resize(w, h)),
        _ => None,
    }
}

fn map_key(k: KeyEvent) -> Option<Action> {
    if k.kind != KeyEventKind::Press && k.kind != KeyEventKind::Repeat {
        return None;
    }
    if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::NextPalette),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::RandomizeMacros),
        KeyCode::Char('0') => Some(Action::ResetMacros),
        KeyCode::Char(c @ '1'..='8') => {
            let i = c as usize - '1' as usize;
            Macro::ALL.get(i).copied().map(Action::SelectMacro)
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::NudgeMacro(MACRO_STEP)),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::NudgeMacro(-MACRO_STEP)),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Action::ToggleInertia),
        _ => None,
    }
}

fn map_mouse(m: MouseEvent) -> Option<Action> {
    let (x, y) = (m.column as f32, m.row as f32);
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Action::PointerDown(x, y)),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(Action::PointerMove(x, y))
        }
        MouseEventKind::Up(MouseButton::Left) => Some(Action::PointerUp(x, y)),
        _ => None,
    }
}
