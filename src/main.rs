mod app;
mod config;

use crate::app::{App, fatal};
use std::path::Path;
use winit::event_loop::{ControlFlow, EventLoop};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match config::load_scene_config(Path::new(config::CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => fatal(format!("{e:#}")),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => fatal(e),
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        fatal(e);
    }
}
