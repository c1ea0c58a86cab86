use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::audio::AudioEnvironment;
use crate::config::Config;
use crate::render::PixelSurface;
use crate::spectrum::{self, SharedSpectrum, SpectrumState};
use crate::timing::{FrameScheduler, IntervalScheduler};

pub async fn run(config: Config, env: &AudioEnvironment, encoded: Vec<u8>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    terminal.hide_cursor()?;

    let result = run_app(&mut terminal, config, env, encoded).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// One terminal cell stacks two vertically adjacent pixels with the upper
/// half block, so the drawing surface is (cols) x (2 * rows) pixels. The top
/// row is reserved for the status line.
fn surface_size(cols: u16, rows: u16) -> (usize, usize) {
    (cols as usize, rows.saturating_sub(1) as usize * 2)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    env: &AudioEnvironment,
    encoded: Vec<u8>,
) -> Result<()> {
    let target_fps = config.display.target_fps;
    let session = spectrum::play(env, config, encoded);

    let size = terminal.size()?;
    let (width, height) = surface_size(size.width, size.height);
    let mut surface = PixelSurface::new(width, height);
    session
        .lock()
        .unwrap()
        .recompute_geometry(surface.width() as f32, surface.height() as f32);

    let mut scheduler = IntervalScheduler::new(target_fps);
    let handle = scheduler.request_frame();
    session.lock().unwrap().frame_scheduled(handle);

    loop {
        if scheduler.next_frame().await.is_none() {
            // stop() cancelled the chain
            break;
        }
        // Keep the frame chain alive first, so a stop during input handling
        // has a pending request to cancel.
        let handle = scheduler.request_frame();
        session.lock().unwrap().frame_scheduled(handle);

        // Drain input without blocking the frame
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(
                    KeyEvent {
                        code: KeyCode::Char('q'),
                        ..
                    }
                    | KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    },
                ) => {
                    info!("stop requested");
                    session.lock().unwrap().stop(&mut scheduler);
                }
                Event::Resize(cols, rows) => {
                    let (width, height) = surface_size(cols, rows);
                    surface.resize(width, height);
                    session
                        .lock()
                        .unwrap()
                        .recompute_geometry(surface.width() as f32, surface.height() as f32);
                }
                _ => {}
            }
        }

        let state = session.lock().unwrap().state();
        match state {
            SpectrumState::Running => {
                session
                    .lock()
                    .unwrap()
                    .render_frame(&mut surface, Instant::now());
            }
            SpectrumState::Failed => {
                error!("audio could not be decoded");
                break;
            }
            _ => {}
        }

        terminal.draw(|frame| {
            let area = frame.area();
            blit(frame, area, &surface);
            render_status(frame, area, &session);
        })?;
    }

    Ok(())
}

/// Copy the pixel buffer into the cell grid below the status line, two
/// pixels per cell via '▀' (fg = upper pixel, bg = lower pixel).
fn blit(frame: &mut Frame, area: Rect, surface: &PixelSurface) {
    let buffer = frame.buffer_mut();
    for row in 1..area.height {
        let py = (row - 1) as usize * 2;
        for col in 0..area.width {
            let top = surface.pixel(col as usize, py).over_black();
            let bottom = surface.pixel(col as usize, py + 1).over_black();
            if let Some(cell) = buffer.cell_mut((area.x + col, area.y + row)) {
                cell.set_char('▀');
                cell.set_fg(Color::Rgb(top.0, top.1, top.2));
                cell.set_bg(Color::Rgb(bottom.0, bottom.1, bottom.2));
            }
        }
    }
}

fn render_status(frame: &mut Frame, area: Rect, session: &SharedSpectrum) {
    let spectrum = session.lock().unwrap();
    let state = match spectrum.state() {
        SpectrumState::Idle => "idle",
        SpectrumState::Decoding => "decoding",
        SpectrumState::Running if spectrum.playback_finished(Instant::now()) => "finished",
        SpectrumState::Running => "playing",
        SpectrumState::Failed => "failed",
    };
    let mut status = format!(
        " specglow | {} | particles: {} ",
        state,
        spectrum.particle_count()
    );
    if spectrum.config().display.show_fps {
        status.push_str(&format!("| {:.0} fps ", spectrum.fps()));
    }
    status.push_str("| [q]uit ");
    drop(spectrum);

    for (i, ch) in status.chars().enumerate() {
        if i < area.width as usize {
            if let Some(cell) = frame.buffer_mut().cell_mut((area.x + i as u16, area.y)) {
                cell.set_char(ch);
                cell.set_fg(Color::DarkGray);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_reserves_the_status_row() {
        assert_eq!(surface_size(80, 24), (80, 46));
        assert_eq!(surface_size(80, 1), (80, 0));
        assert_eq!(surface_size(80, 0), (80, 0));
    }
}
