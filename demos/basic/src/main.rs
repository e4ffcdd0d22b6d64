use log::{error, info};

mod app;

use app::App;

const FRAMES: u32 = 120;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut app = match App::new() {
        Ok(app) => app,
        Err(error) => {
            error!("could not start the cluster: {}", error);
            return;
        }
    };

    for frame_id in 1..=FRAMES {
        if !app.update(frame_id) {
            break;
        }
    }
    app.shutdown();
    info!("Basic Lockstep Demo finished");
}
