use dropline::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  ai            play against the computer
  friend        open the multiplayer menu
  create        create a room (multiplayer menu)
  join <id>     join a room (multiplayer menu)
  move <n>, <n> drop a disc in column n
  leave         leave the game, back to the menu
  quit          exit";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Intent(Intent),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return None,
        "ai" => Command::Intent(Intent::StartAi),
        "friend" | "multi" => Command::Intent(Intent::GoToMultiplayerMenu),
        "create" => Command::Intent(Intent::CreateRoom),
        // A missing ID is passed through; the client prompts for one.
        "join" => Command::Intent(Intent::JoinRoom(rest.to_string())),
        "move" => match rest.trim().parse() {
            Ok(column) => Command::Intent(Intent::MakeMove(column)),
            Err(_) => Command::Unknown(line.to_string()),
        },
        "leave" | "menu" => Command::Intent(Intent::LeaveGame),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => match other.parse() {
            Ok(column) => Command::Intent(Intent::MakeMove(column)),
            Err(_) => Command::Unknown(line.to_string()),
        },
    };
    Some(command)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn disc(seat: PlayerNum) -> char {
    match seat {
        PlayerNum::One => 'X',
        PlayerNum::Two => 'O',
    }
}

fn cell_char(cell: CellValue) -> char {
    cell.owner().map_or('.', disc)
}

fn render_board(board: &Board) -> String {
    // Header plus one line per row, two chars per cell.
    let mut out = String::with_capacity((board.rows() + 1) * (board.cols() * 2 + 1));
    for col in 0..board.cols() {
        out.push_str(&format!("{col} "));
    }
    out.push('\n');
    for row in board.iter_rows() {
        for &cell in row {
            out.push(cell_char(cell));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn render(snap: &SessionSnapshot) -> String {
    let mut out = String::new();
    match snap.screen {
        Screen::Menu => out.push_str("[menu] ai | friend | quit\n"),
        Screen::MultiplayerMenu => out.push_str("[multiplayer] create | join <id> | leave\n"),
        Screen::Game => {
            if let Some(room) = snap.shareable_room_id() {
                out.push_str(&format!("room: {room}\n"));
            }
            if let Some(seat) = snap.player_num() {
                let opponent = seat.opponent();
                out.push_str(&format!(
                    "you are {seat} ({}), opponent is {opponent} ({})\n",
                    disc(seat),
                    disc(opponent)
                ));
            }
            if let Some(game) = &snap.game {
                out.push_str(&render_board(&game.board));
            }
        }
    }
    out.push_str(&format!("> {}", snap.status));
    out
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DROPLINE_SERVER_URL").ok())
        .unwrap_or_else(|| ClientConfig::DEFAULT_SERVER_URL.to_string());
    tracing::info!(%server_url, "starting terminal client");

    let client = Client::builder().server_url(server_url).build()?;
    let (intents, intents_rx) = mpsc::channel(16);
    let (view_tx, mut view) = watch::channel(SessionSnapshot::default());
    let client_task = tokio::spawn(client.run(intents_rx, view_tx));

    // Ends when the client loop drops its sender.
    let renderer = tokio::spawn(async move {
        println!("{}\n{}", HELP, render(&view.borrow_and_update()));
        while view.changed().await.is_ok() {
            let snap = view.borrow_and_update().clone();
            println!("\n{}", render(&snap));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            None => {}
            Some(Command::Intent(intent)) => {
                if intents.send(intent).await.is_err() {
                    break;
                }
            }
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Quit) => break,
            Some(Command::Unknown(input)) => println!("unknown command: {input} (try `help`)"),
        }
    }

    drop(intents);
    client_task.await?;
    renderer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_commands() {
        assert_eq!(parse_command("ai"), Some(Command::Intent(Intent::StartAi)));
        assert_eq!(
            parse_command("  Friend "),
            Some(Command::Intent(Intent::GoToMultiplayerMenu))
        );
        assert_eq!(parse_command("create"), Some(Command::Intent(Intent::CreateRoom)));
        assert_eq!(parse_command("leave"), Some(Command::Intent(Intent::LeaveGame)));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_parse_join_keeps_id() {
        assert_eq!(
            parse_command("join abc123"),
            Some(Command::Intent(Intent::JoinRoom("abc123".into())))
        );
        assert_eq!(
            parse_command("join"),
            Some(Command::Intent(Intent::JoinRoom(String::new())))
        );
    }

    #[test]
    fn test_parse_moves() {
        assert_eq!(parse_command("move 3"), Some(Command::Intent(Intent::MakeMove(3))));
        assert_eq!(parse_command("6"), Some(Command::Intent(Intent::MakeMove(6))));
        assert_eq!(
            parse_command("move left"),
            Some(Command::Unknown("move left".into()))
        );
        assert_eq!(parse_command("dance"), Some(Command::Unknown("dance".into())));
    }

    #[test]
    fn test_render_board() {
        let mut board = Board::empty(2, 3).unwrap();
        board.set(1, 0, CellValue::PlayerOne);
        board.set(1, 1, CellValue::PlayerTwo);
        assert_eq!(render_board(&board), "0 1 2 \n. . . \nX O . \n");
    }

    #[test]
    fn test_render_game_names_both_seats() {
        let snap = SessionSnapshot {
            screen: Screen::Game,
            phase: SessionPhase::InGame,
            mode: Some(GameMode::Multiplayer),
            session: Some(Session {
                room_id: RoomId::new("abc123"),
                player_num: PlayerNum::Two,
                mode: GameMode::Multiplayer,
            }),
            ..SessionSnapshot::default()
        };
        let out = render(&snap);
        assert!(out.contains("room: abc123"));
        assert!(out.contains("you are Player 2 (O), opponent is Player 1 (X)"));
    }

    #[test]
    fn test_render_menu() {
        let out = render(&SessionSnapshot::default());
        assert!(out.starts_with("[menu]"));
        assert!(out.ends_with(text::WELCOME));
    }
}
