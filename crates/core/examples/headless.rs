use std::env;

use webshell_core::{Command, ShellBuilder, Surface, SurfaceHost};

const TARGET: &str = "https://app.example.com/";

struct PrintingHost;

impl SurfaceHost for PrintingHost {
    fn show(&self, surface: Surface) {
        println!("show {surface:?}");
    }

    fn execute_script(&self, script: String) {
        println!("overlay script, {} bytes", script.len());
    }

    fn read_clipboard(&self) -> Option<String> {
        None
    }
}

#[tokio::main]
async fn main() {
    let _ = env_logger::builder().parse_default_env().try_init();

    let mut args = env::args().skip(1);
    let export = args.next();
    let data_dir = env::temp_dir().join("webshell-headless");

    let builder = ShellBuilder::new();
    builder.set_target_url(TARGET.into());
    builder.set_data_dir(data_dir.to_string_lossy().into_owned());
    builder.set_surface_host(Box::new(PrintingHost));
    let shell = builder.build().expect("Failed to build the shell");

    let entry = shell.start().await.expect("Failed to start the shell");
    println!("started on {entry:?}");

    if let Some(path) = export {
        let reply = shell
            .invoke(Command::ImportCookiesAndReload { path: Some(path) })
            .await;
        println!("{}", reply.to_json());
        shell.page_loaded(shell.target_url());
    }
}
