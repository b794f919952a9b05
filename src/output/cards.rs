use colored::Colorize;

use crate::model::{CharacterRecord, CharacterStatus, EpisodeRecord, LocationRecord, Record};

pub fn render_card(index: usize, record: &Record, no_color: bool) -> String {
    match record {
        Record::Character(c) => character_card(index, c, no_color),
        Record::Location(l) => location_card(index, l, no_color),
        Record::Episode(e) => episode_card(index, e, no_color),
    }
}

fn title(index: usize, text: &str, no_color: bool) -> String {
    let line = format!("{index:>4}. {text}");
    if no_color {
        line
    } else {
        line.bold().to_string()
    }
}

fn status_label(status: CharacterStatus, no_color: bool) -> String {
    let label = status.as_str();
    if no_color {
        return label.to_string();
    }
    match status {
        CharacterStatus::Alive => label.green().to_string(),
        CharacterStatus::Dead => label.red().to_string(),
        CharacterStatus::Unknown => label.to_string(),
    }
}

fn character_card(index: usize, c: &CharacterRecord, no_color: bool) -> String {
    format!(
        "{}\n      Status: {}\n      Species: {}\n      Gender: {}\n      From: {}\n      Image: {}\n",
        title(index, &c.name, no_color),
        status_label(c.status, no_color),
        c.species,
        c.gender,
        c.origin.name,
        c.image
    )
}

fn location_card(index: usize, l: &LocationRecord, no_color: bool) -> String {
    format!(
        "{}\n      Type: {}\n      Dimension: {}\n",
        title(index, &l.name, no_color),
        l.kind,
        l.dimension
    )
}

fn episode_card(index: usize, e: &EpisodeRecord, no_color: bool) -> String {
    format!(
        "{}\n      Name: {}\n      Date: {}\n",
        title(index, &e.episode, no_color),
        e.name,
        e.air_date
    )
}
