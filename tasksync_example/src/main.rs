mod command;
mod render;

use std::error::Error;
use std::sync::Arc;

use command::Command;
use dotenvy::dotenv;
use tasksync::telemetry::{self, LogSink};
use tasksync::{TaskSyncBuilder, TaskSyncConfig};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let config = TaskSyncConfig::from_env()?;
    log::info!(
        "Local store: {}, remote store: {}",
        config.local_url,
        config.remote_url.as_deref().unwrap_or("in-memory")
    );

    if let Err(e) = telemetry::install(LogSink) {
        log::warn!("{e}");
    }

    let sync = Arc::new(TaskSyncBuilder::from_config(&config).build().await?);
    let _watcher = sync.spawn_connectivity_watcher();

    // A failed first load is logged inside; start from whatever is local.
    let _ = sync.load().await;
    print!("{}", render_view(&sync).await);

    loop {
        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                println!("error: {}", error);
                continue;
            }
        }

        let command = match command::parse(&input, sync.utc_offset()) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Add(draft) => match sync.add_task(draft).await {
                Ok(task) => println!("added task {}", task.id),
                Err(e) => println!("could not add task: {e}"),
            },
            Command::Online => {
                // The watcher reconciles on the transition.
                sync.connectivity().set_online(true);
            }
            Command::Offline => {
                sync.connectivity().set_online(false);
            }
            Command::Sync => {
                if let Err(e) = sync.load().await {
                    println!("sync failed: {e}");
                }
            }
            Command::List => {}
        }

        print!("{}", render_view(&sync).await);
    }

    Ok(())
}

async fn render_view(sync: &tasksync::TaskSync) -> String {
    let today = sync.today();
    let groups = sync.grouped(today).await;
    render::render(
        &groups,
        today,
        sync.utc_offset(),
        !sync.connectivity().is_online(),
    )
}
