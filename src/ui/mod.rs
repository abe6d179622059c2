pub mod canvas;
pub mod header;
pub mod home;
pub mod widgets;

use ratatui::prelude::*;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if let Some(session) = app.session_mut() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // header
                Constraint::Min(0),    // game
            ])
            .split(area);

        header::render_header(frame, session, chunks[0]);
        session.game.render(frame, chunks[1]);
        return;
    }
    home::render_home(frame, area, app);
}
