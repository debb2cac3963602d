//=========================================================================
// Basic Window Demo
//
// Opens a resizable desktop window, logs keyboard and mouse input, and
// cycles the clear color. Escape or closing the window quits; F toggles
// desktop fullscreen; C toggles the cursor.
//
// Run with:
//   RUST_LOG=debug cargo run --example basic_window
//
//=========================================================================

use std::cell::Cell;
use std::rc::Rc;

use env_logger::{Builder, Env};
use log::info;
use rime_engine::platform::ClearColor;
use rime_engine::prelude::*;

const WINDOWED_SIZE: UVec2 = UVec2::new(1024, 640);

/// Frames per full trip around the color wheel.
const COLOR_PERIOD: u64 = 600;

fn clear_color(frame: u64) -> ClearColor {
    let phase = (frame % COLOR_PERIOD) as f32 / COLOR_PERIOD as f32 * std::f32::consts::TAU;
    let channel = |offset: f32| 0.10 + 0.08 * (phase + offset).sin();
    [channel(0.0), channel(2.1), channel(4.2), 1.0]
}

fn main() -> Result<(), EngineError> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut engine = EngineBuilder::new()
        .with_size(WINDOWED_SIZE.x, WINDOWED_SIZE.y)
        .with_mode(WindowMode::Resizable)
        .with_caption("Rime Engine: basic window")
        .with_clear_color(clear_color(0))
        .with_crash_dump_prefix("basic_window")
        .build()?;

    let stop = engine.stop_handle();
    let Some(window) = engine.window() else {
        return Ok(());
    };

    //--- Window -----------------------------------------------------------

    let on_close = stop.clone();
    window.on_close().connect(move |_| on_close.stop());
    window
        .on_resize()
        .connect(|size| info!("Resized to {}x{}", size.x, size.y));

    //--- Keyboard ---------------------------------------------------------

    // Handlers only record requests; the loop applies them through the
    // window and mouse.
    let toggle_fullscreen = Rc::new(Cell::new(false));
    let toggle_cursor = Rc::new(Cell::new(false));

    if let Some(keyboard) = engine.keyboard() {
        let on_key = stop.clone();
        let fullscreen = toggle_fullscreen.clone();
        let cursor = toggle_cursor.clone();
        keyboard.on_key_down().connect(move |&(modifiers, key)| {
            info!("Key down: {} ({:?})", key, modifiers);
            match key {
                Key::Escape => on_key.stop(),
                Key::KeyF => fullscreen.set(true),
                Key::KeyC => cursor.set(true),
                _ => {}
            }
        });
        keyboard
            .on_key_up()
            .connect(|&(_, key)| info!("Key up: {}", key));
        keyboard.on_text().connect(|text: &str| info!("Text: {:?}", text));
    }

    //--- Mouse ------------------------------------------------------------

    if let Some(mouse) = engine.mouse() {
        mouse
            .on_button_down()
            .connect(|(button, at)| info!("{:?} down at {}", button, at));
        mouse
            .on_button_up()
            .connect(|(button, at)| info!("{:?} up at {}", button, at));
        mouse.on_wheel().connect(|delta| info!("Wheel {}", delta));
    }

    //--- Main loop --------------------------------------------------------

    let mut frame = 0u64;
    engine.start();
    while engine.is_running() {
        if toggle_fullscreen.replace(false) {
            if let Some(window) = engine.window() {
                let mode = match window.mode() {
                    WindowMode::DesktopFullscreen => WindowMode::Resizable,
                    _ => WindowMode::DesktopFullscreen,
                };
                window.resize(WINDOWED_SIZE, mode);
            }
        }
        if toggle_cursor.replace(false) {
            if let Some(mouse) = engine.mouse() {
                mouse.set_cursor_visible(!mouse.is_cursor_visible());
            }
        }
        if let Some(window) = engine.window() {
            window.set_clear_color(clear_color(frame));
        }

        engine.tick();
        frame += 1;
    }

    info!("Presented {} frames", frame);
    Ok(())
}
