mod app;
mod input;
mod term;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
