use orb_runtime::{Graphics, RcWindow, SceneConfig, create_graphics};
use std::fmt::Display;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

/// Logs the diagnostic and terminates; nothing built so far is kept.
pub fn fatal(err: impl Display) -> ! {
    log::error!("{err}");
    std::process::exit(1);
}

enum State {
    Init,
    Ready(Graphics),
}

pub struct App {
    state: State,
    config: SceneConfig,
}

impl App {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            state: State::Init,
            config,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let State::Init = self.state {
            let view = &self.config.view;
            let win_attr = Window::default_attributes()
                .with_title("orb")
                .with_inner_size(PhysicalSize::new(view.width, view.height))
                .with_resizable(false);

            let window: RcWindow = match event_loop.create_window(win_attr) {
                Ok(window) => std::sync::Arc::new(window),
                Err(e) => fatal(e),
            };

            let gfx = match pollster::block_on(create_graphics(window, &self.config)) {
                Ok(gfx) => gfx,
                Err(e) => fatal(e),
            };
            gfx.request_redraw();
            self.state = State::Ready(gfx);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let State::Ready(gfx) = &mut self.state else {
            return;
        };
        match event {
            WindowEvent::Resized(size) => gfx.resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(e) = gfx.draw() {
                    fatal(e);
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            _ => {}
        }
    }
}
