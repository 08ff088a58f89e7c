// Auction draft engine entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load league config
// 3. Start the draft session (engine loop + timers)
// 4. Spawn the event printer task
// 5. Run the stdin command console until quit
//
// The console is a thin operator surface over the engine handle; bids and
// nominations normally arrive from a richer client, but the same commands
// work line-by-line here.

use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use auction_draft::config;
use auction_draft::engine::events::DraftEvent;
use auction_draft::engine::machine::AuctionEvent;
use auction_draft::engine::session::{DraftSession, EngineHandle};
use auction_draft::player::{Player, Position};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Auction draft engine starting up");

    // 2. Load league config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, ${} budget, {} roster slots",
        config.league.name,
        config.league.num_teams,
        config.league.budget,
        config.league.roster_size()
    );

    // 3. Start the draft session
    let handle = DraftSession::start(&config.league, &config.timers);

    // 4. Spawn the event printer task
    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            print_event(&event);
        }
    });

    // 5. Run the stdin command console until quit
    println!("auction draft console ready (type 'help' for commands)");
    run_console(&handle).await?;

    handle.shutdown().await;
    let _ = tokio::time::timeout(Duration::from_secs(5), printer).await;

    info!("Auction draft engine shut down cleanly");
    Ok(())
}

async fn run_console(handle: &EngineHandle) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let args: Vec<&str> = line.split_whitespace().collect();
        let result = match args.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["help"] => {
                print_help();
                continue;
            }
            ["nominate", team_id, player_id, pos, price] => {
                nominate(handle, team_id, player_id, pos, price).await
            }
            ["open"] => handle.transition(AuctionEvent::OpenBidding).await,
            ["bid", team_id, amount] => match amount.parse() {
                Ok(amount) => {
                    handle
                        .transition(AuctionEvent::PlaceBid {
                            team_id: team_id.to_string(),
                            amount,
                        })
                        .await
                }
                Err(_) => {
                    println!("bid amount must be a whole dollar figure");
                    continue;
                }
            },
            ["pause"] => handle.transition(AuctionEvent::Pause).await,
            ["resume"] => handle.transition(AuctionEvent::Resume).await,
            ["next"] => handle.transition(AuctionEvent::NextPlayer).await,
            ["complete"] => handle.transition(AuctionEvent::CompleteAuction).await,
            ["undo"] => {
                match handle.undo_last_pick().await? {
                    Some(pick) => println!(
                        "undid: {} to {} for ${}",
                        pick.player.name, pick.team_id, pick.price
                    ),
                    None => println!("nothing to undo"),
                }
                continue;
            }
            ["status", team_id] => {
                match handle.team_status(team_id).await? {
                    Some(s) => println!(
                        "{}: ${} of ${} spent, {} open slots, max bid ${}",
                        s.team_id, s.spent, s.budget, s.open_slots, s.max_bid
                    ),
                    None => println!("no such team: {team_id}"),
                }
                continue;
            }
            ["state"] => {
                let (phase, context) = handle.snapshot().await?;
                let lot = context
                    .current_player
                    .map(|p| p.name)
                    .unwrap_or_else(|| "-".into());
                println!(
                    "phase={phase:?} lot={lot} bid=${} bidder={} next-nominator={}",
                    context.current_bid,
                    context.current_bidder.as_deref().unwrap_or("-"),
                    handle.next_nominator().await?.as_deref().unwrap_or("-"),
                );
                continue;
            }
            ["snapshot"] => {
                let (_, context) = handle.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&context)?);
                continue;
            }
            ["history"] => {
                for event in handle.bid_history(None).await? {
                    println!(
                        "{:?} {} {} ${}",
                        event.kind, event.player_id, event.team_id, event.amount
                    );
                }
                continue;
            }
            _ => {
                println!("unrecognized command (type 'help')");
                continue;
            }
        };

        match result {
            Ok(true) => {}
            Ok(false) => println!("rejected (illegal for current phase)"),
            Err(e) => {
                error!("engine request failed: {e}");
                break;
            }
        }
    }

    Ok(())
}

async fn nominate(
    handle: &EngineHandle,
    team_id: &str,
    player_id: &str,
    pos: &str,
    price: &str,
) -> Result<bool, auction_draft::engine::session::SessionError> {
    let Some(position) = Position::from_str_pos(pos) else {
        println!("unknown position: {pos}");
        return Ok(true);
    };
    let Ok(market_price) = price.parse() else {
        println!("market price must be a whole dollar figure");
        return Ok(true);
    };
    handle
        .transition(AuctionEvent::NominatePlayer {
            player: Player {
                id: player_id.to_string(),
                name: player_id.to_string(),
                position,
                team: String::new(),
                market_price,
                intrinsic_value: None,
            },
            team_id: team_id.to_string(),
        })
        .await
}

fn print_event(event: &DraftEvent) {
    match event {
        DraftEvent::StateChange { phase, context } => {
            println!(
                "-> {phase:?} (bid ${}, {}s on the clock)",
                context.current_bid, context.time_remaining_secs
            );
        }
        DraftEvent::PlayerSold {
            player,
            team_id,
            amount,
            ..
        } => println!("SOLD: {} to {team_id} for ${amount}", player.name),
        DraftEvent::PlayerPassed { player, .. } => {
            println!("PASSED: {} (no bids)", player.name);
        }
        DraftEvent::AuctionPaused { context } => {
            println!("paused ({}s remaining)", context.time_remaining_secs);
        }
        DraftEvent::AuctionResumed { context } => {
            println!("resumed ({}s on the clock)", context.time_remaining_secs);
        }
        DraftEvent::AuctionCompleted { final_budgets, .. } => {
            println!("auction complete:");
            for status in final_budgets {
                println!("  {}: ${} spent", status.team_id, status.spent);
            }
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  nominate <team> <player> <pos> <price>   put a player up for bidding");
    println!("  open                                     open bidding at market price");
    println!("  bid <team> <amount>                      place a bid");
    println!("  pause | resume                           pause/resume the clock");
    println!("  next                                     advance to the next nomination");
    println!("  undo                                     reverse the last sale");
    println!("  status <team>                            show a team's budget");
    println!("  state | history                          show auction state / bid log");
    println!("  snapshot                                 dump the full context as JSON");
    println!("  complete                                 finish the draft");
    println!("  quit                                     exit");
}

/// Initialize tracing to log to a file, keeping the terminal for the console.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("auctiond.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_draft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
