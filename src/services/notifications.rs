//! Builds the audience-scoped messages posted when game state changes.

use crate::state::{
    audit::{Report, Reports},
    board::BingoTransition,
    message::{Message, Operation, Recipient},
    phrase::Phrase,
    player::Player,
};

const BINGO: &str = "<em><strong>BINGO</strong></em>";

/// Announces that a game opened.
pub fn game_started() -> Message {
    Message::new("Game has begun!").to(Recipient::All)
}

/// A player opened a board they already had.
pub fn player_rejoined(player: &Player) -> Message {
    Message::new(format!("<strong>{}</strong> rejoined the game.", player.name))
        .to(Recipient::Admin)
        .to_player(&player.email)
}

/// Announces a new player to the room.
pub fn player_joined(player: &Player) -> Message {
    Message::new(format!(
        "<strong>{}</strong> got a board and joined the game.",
        player.name
    ))
    .to(Recipient::All)
}

/// Tells the room a phrase was selected or cleared.
pub fn phrase_selected(player: &Player, phrase: &Phrase) -> Message {
    let verb = if phrase.selected { "selected" } else { "unselected" };
    Message::new(format!(
        "<strong>{}</strong> {verb} <em>{}</em> on their board.",
        player.name, phrase.text
    ))
    .to(Recipient::Admin)
    .to_player(&player.email)
}

/// Tells the player's client to drop its board and fetch a new one.
pub fn board_reset(player: &Player) -> Message {
    Message::new("Your game is being reset")
        .to_player(&player.email)
        .with_operation(Operation::Reset)
}

/// Asks every client to refresh after a phrase edit.
pub fn phrase_changed() -> Message {
    Message::new("A square has been changed and reset for all players. ").to(Recipient::All)
}

/// The player's bingo no longer holds after a phrase edit.
pub fn bingo_rescinded(player: &Player) -> Vec<Message> {
    vec![
        Message::new(format!(
            "An action from the <strong>game managers</strong> has rescinded your {BINGO}"
        ))
        .to_player(&player.email)
        .bingo(),
        Message::new(format!(
            "<strong>{}</strong> just lost their {BINGO}",
            player.name
        ))
        .to(Recipient::Admin)
        .bingo(),
    ]
}

/// Messages for a board that holds a bingo after a selection.
///
/// Returns nothing unless `transition` is [`BingoTransition::Declared`] or
/// [`BingoTransition::Held`]. Dubious claims add a summary and one line per
/// winning-line phrase for the admins and the player.
pub fn bingo(player: &Player, transition: BingoTransition, reports: &Reports) -> Vec<Message> {
    let first = match transition {
        BingoTransition::Declared => true,
        BingoTransition::Held => false,
        BingoTransition::None | BingoTransition::Lost => return Vec::new(),
    };

    let mut messages = Vec::new();
    if first {
        messages.push(
            Message::new(format!(
                "<strong>{}</strong> just got {BINGO} on their board.",
                player.name
            ))
            .to(Recipient::All)
            .to_player(&player.email)
            .bingo(),
        );
    } else {
        messages.push(
            Message::new(format!(
                "<strong>You</strong> already had {BINGO} on your board."
            ))
            .to_player(&player.email)
            .bingo(),
        );
    }

    if !reports.is_dubious() {
        return messages;
    }

    let verb = if first { "declared" } else { "redeclared" };
    messages.push(
        Message::new(format!(
            "<strong>{}</strong> might have just {verb} a dubious {BINGO} on their board.",
            player.name
        ))
        .to(Recipient::Admin)
        .to_player(&player.email)
        .bingo(),
    );

    messages.extend(reports.winning_line().map(|report| {
        Message::new(corroboration(report))
            .to(Recipient::Admin)
            .to_player(&player.email)
            .bingo()
    }));

    messages
}

fn corroboration(report: &Report) -> String {
    let others = report.count.saturating_sub(1);
    let other_players = report.total.saturating_sub(1);
    let text = &report.phrase.text;

    if report.count <= 1 {
        format!("<strong>{text}</strong> was selected by <strong>none</strong> of the other {other_players} players")
    } else if report.percent() > 0.5 {
        format!("<strong>{text}</strong> was selected by {others} of the other {other_players} players")
    } else {
        format!(
            "<strong>{text}</strong> was selected by only <strong>{others} of the other {other_players} players</strong>"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new("Pat", "pat@x.com")
    }

    fn report(text: &str, count: usize, total: usize, on_winning_line: bool) -> Report {
        Report {
            phrase: Phrase::new(text, text),
            count,
            total,
            on_winning_line,
        }
    }

    fn audience(message: &Message) -> Vec<String> {
        message.audience.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn join_and_rejoin_audiences() {
        assert_eq!(audience(&player_joined(&player())), vec!["all"]);
        assert_eq!(audience(&player_rejoined(&player())), vec!["admin", "pat@x.com"]);
    }

    #[test]
    fn selection_message_names_the_action() {
        let mut phrase = Phrase::new("1", "Awkward silence");
        phrase.selected = true;
        let selected = phrase_selected(&player(), &phrase);
        assert_eq!(
            selected.text,
            "<strong>Pat</strong> selected <em>Awkward silence</em> on their board."
        );
        assert_eq!(audience(&selected), vec!["admin", "pat@x.com"]);
        assert!(!selected.bingo);

        phrase.selected = false;
        assert!(phrase_selected(&player(), &phrase).text.contains("unselected"));
    }

    #[test]
    fn reset_targets_player_with_operation() {
        let message = board_reset(&player());
        assert_eq!(audience(&message), vec!["pat@x.com"]);
        assert_eq!(message.operation, Some(Operation::Reset));
        assert_eq!(audience(&phrase_changed()), vec!["all"]);
    }

    #[test]
    fn first_bingo_goes_to_everyone() {
        let reports = Reports::new(vec![report("a", 3, 3, true)]);
        let messages = bingo(&player(), BingoTransition::Declared, &reports);
        assert_eq!(messages.len(), 1);
        assert_eq!(audience(&messages[0]), vec!["all", "pat@x.com"]);
        assert!(messages[0].bingo);
    }

    #[test]
    fn held_bingo_only_tells_the_player() {
        let messages = bingo(&player(), BingoTransition::Held, &Reports::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(audience(&messages[0]), vec!["pat@x.com"]);
        assert!(messages[0].text.starts_with("<strong>You</strong> already had"));
    }

    #[test]
    fn no_bingo_means_no_messages() {
        assert!(bingo(&player(), BingoTransition::None, &Reports::default()).is_empty());
        assert!(bingo(&player(), BingoTransition::Lost, &Reports::default()).is_empty());
    }

    #[test]
    fn dubious_bingo_adds_summary_and_one_line_per_winning_phrase() {
        let reports = Reports::new(vec![
            report("lonely", 1, 4, true),
            report("popular", 4, 4, true),
            report("rare", 2, 4, true),
            report("off line", 1, 4, false),
        ]);
        let messages = bingo(&player(), BingoTransition::Declared, &reports);

        assert_eq!(messages.len(), 5);
        assert!(messages[1].text.contains("might have just declared a dubious"));
        assert!(messages[1..].iter().all(|m| m.bingo));
        assert!(
            messages[1..]
                .iter()
                .all(|m| audience(m) == vec!["admin", "pat@x.com"])
        );
        assert_eq!(
            messages[2].text,
            "<strong>lonely</strong> was selected by <strong>none</strong> of the other 3 players"
        );
        assert_eq!(
            messages[3].text,
            "<strong>popular</strong> was selected by 3 of the other 3 players"
        );
        assert_eq!(
            messages[4].text,
            "<strong>rare</strong> was selected by only <strong>1 of the other 3 players</strong>"
        );
    }

    #[test]
    fn rescinded_bingo_informs_player_and_admins() {
        let messages = bingo_rescinded(&player());
        assert_eq!(audience(&messages[0]), vec!["pat@x.com"]);
        assert_eq!(audience(&messages[1]), vec!["admin"]);
        assert!(messages.iter().all(|m| m.bingo));
    }
}
