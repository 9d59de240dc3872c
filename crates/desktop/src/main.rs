mod app;
mod settings;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("Framescope")
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(900.0, 640.0),
            ..Default::default()
        })
        .run()
}
