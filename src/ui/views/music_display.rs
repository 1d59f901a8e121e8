use async_trait::async_trait;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{
    audio::PlaybackState,
    http::Track,
    ui::{
        components::spinner::Spinner,
        context::AppContext,
        models::{MusicViewModel, music::COVER_SIZE},
        traits::{Action, View},
    },
    util::colors,
};

pub struct MusicDisplay {
    vm: MusicViewModel,
    list_state: ListState,
}

impl MusicDisplay {
    pub fn new(vm: MusicViewModel) -> Self {
        Self {
            vm,
            list_state: ListState::default(),
        }
    }

    fn selected(&self) -> Option<Track> {
        let index = self.list_state.selected()?;
        self.vm.tracks().with(|tracks| tracks.get(index).cloned())
    }

    fn render_cover(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::new().fg(colors::NEUTRAL));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let Some(track) = self.selected() else {
            return;
        };
        self.vm.load_cover(&track.album_cover_url);
        self.vm.covers().with(|covers| {
            if let Some(cover) = covers.get(&track.album_cover_url) {
                f.render_widget(cover, inner);
            }
        });
    }
}

fn marker(state: &PlaybackState, url: &str) -> &'static str {
    match state {
        PlaybackState::Buffering(u) if u == url => "…",
        PlaybackState::Playing(u) if u == url => "▶",
        PlaybackState::Paused(u) if u == url => "‖",
        _ => " ",
    }
}

#[async_trait]
impl View for MusicDisplay {
    async fn on_mount(&mut self, _ctx: &AppContext) {
        self.vm.fetch_music();
    }

    fn render(&mut self, f: &mut Frame, area: Rect, _ctx: &AppContext) {
        let [list_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        let tracks = self.vm.tracks().get();
        if tracks.is_empty() {
            if self.vm.is_loading().get() {
                let spinner = Spinner::new()
                    .with_style(Style::new().fg(colors::PRIMARY))
                    .with_label(format!("Searching \"{}\"...", self.vm.search_term()));
                f.render_widget(spinner, list_area);
            } else if let Some(error) = self.vm.error().get() {
                f.render_widget(
                    Paragraph::new(vec![
                        Line::styled(error, Style::new().fg(colors::ERROR)),
                        Line::styled("[r] retry", Style::new().fg(colors::NEUTRAL)),
                    ]),
                    list_area,
                );
            } else {
                f.render_widget(Paragraph::new("No tracks found"), list_area);
            }
        } else {
            let playback = self.vm.playback().get();
            let items: Vec<ListItem> = tracks
                .iter()
                .map(|track| {
                    ListItem::new(vec![
                        Line::from(vec![
                            Span::styled(
                                format!("{} ", marker(&playback, &track.preview_url)),
                                Style::new().fg(colors::ACCENT),
                            ),
                            Span::styled(
                                track.title.clone(),
                                Style::new().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                    ])
                })
                .collect();

            let list = List::new(items)
                .highlight_style(
                    Style::default()
                        .fg(colors::PRIMARY)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            if self.list_state.selected().is_none() {
                self.list_state.select(Some(0));
            }
            let [tracks_area, cover_area] = Layout::horizontal([
                Constraint::Min(1),
                Constraint::Length(COVER_SIZE.0 + 2),
            ])
            .spacing(1)
            .areas(list_area);
            let cover_area = Rect {
                height: (COVER_SIZE.1 + 2).min(cover_area.height),
                ..cover_area
            };
            f.render_stateful_widget(list, tracks_area, &mut self.list_state);
            self.render_cover(f, cover_area);
        }

        let status = match self.vm.playback().get() {
            PlaybackState::Error(e) => Line::styled(e, Style::new().fg(colors::ERROR)),
            _ => Line::styled(
                "[enter] play  [space] pause/resume  [r] reload",
                Style::new().fg(colors::NEUTRAL),
            ),
        };
        f.render_widget(Paragraph::new(status), status_area);
    }

    async fn handle_input(&mut self, key: KeyEvent, _ctx: &AppContext) -> Option<Action> {
        let len = self.vm.tracks().with(|t| t.len());
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    let i = self
                        .list_state
                        .selected()
                        .map_or(0, |i| if i >= len - 1 { i } else { i + 1 });
                    self.list_state.select(Some(i));
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if len > 0 {
                    let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
                    self.list_state.select(Some(i));
                }
            }
            KeyCode::Char('g') if len > 0 => self.list_state.select(Some(0)),
            KeyCode::Char('G') if len > 0 => self.list_state.select(Some(len - 1)),
            KeyCode::Enter => {
                if let Some(track) = self.selected() {
                    self.vm.init_and_play(&track.preview_url);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(track) = self.selected() {
                    self.vm.toggle(&track.preview_url);
                }
            }
            KeyCode::Char('r') => self.vm.fetch_music(),
            _ => {}
        }
        None
    }
}
