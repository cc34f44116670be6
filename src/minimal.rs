// Intersects two rays with a single triangle and prints the outcome.
// Does not open a window, see `viewer` for that.

use rt::tutorial;

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    // Errors from here on are printed by the device's error function
    let device = tutorial::initialize_device(None)?;
    let scene = tutorial::initialize_scene(&device)?;

    for org in [[0., 0., -1.], [1., 1., -1.]] {
        let ray = tutorial::trace(&scene, org, [0., 0., 1.]);

        println!("{}", tutorial::describe(&ray));
    }

    Ok(())
}
