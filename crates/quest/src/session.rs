use std::path::PathBuf;

use tracing::{info, warn};
use world::{
    parent_coordinate, save_player, ChestOutcome, ChestRewardPolicy, Coordinate, MapAtlas,
    PlayerState, TerrainGrid, TerrainKind,
};

use crate::bootstrap::{AppError, QuestSettings};

pub(crate) const VIEW_WIDTH: u32 = 24;
pub(crate) const VIEW_HEIGHT: u32 = 12;
const PLAYER_GLYPH: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Move(Direction),
    Interact,
    Save,
    Map,
    Status,
    Inventory,
    Use { slot: usize },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (type 'help' for commands)", self.reason)
    }
}

pub(crate) fn parse_command(line: &str) -> Result<Command, CommandParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandParseError {
            reason: "empty command".to_string(),
        });
    };
    let args = words.collect::<Vec<_>>();
    let command = match head.to_ascii_lowercase().as_str() {
        "n" | "north" => Command::Move(Direction::North),
        "s" | "south" => Command::Move(Direction::South),
        "e" | "east" => Command::Move(Direction::East),
        "w" | "west" => Command::Move(Direction::West),
        "i" | "interact" => Command::Interact,
        "save" => Command::Save,
        "map" | "look" => Command::Map,
        "status" => Command::Status,
        "inv" | "inventory" => Command::Inventory,
        "use" => {
            let raw = args.first().ok_or_else(|| CommandParseError {
                reason: "usage: use <slot>".to_string(),
            })?;
            let slot = raw.parse::<usize>().map_err(|_| CommandParseError {
                reason: format!("invalid slot '{raw}'"),
            })?;
            return Ok(Command::Use { slot });
        }
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => {
            return Err(CommandParseError {
                reason: format!("unknown command '{other}'"),
            })
        }
    };
    if !args.is_empty() {
        return Err(CommandParseError {
            reason: format!("'{head}' takes no arguments"),
        });
    }
    Ok(command)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    HireShip,
    Disembark,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Reply {
    pub(crate) lines: Vec<String>,
    pub(crate) quit: bool,
}

impl Reply {
    fn say(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            quit: false,
        }
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

/// Loads the saved player when the save file exists, otherwise places a new
/// player at the main map's starting coordinate. A saved player inside a child
/// map gets that map built again.
pub(crate) fn start_player(
    atlas: &mut MapAtlas,
    settings: &QuestSettings,
) -> Result<PlayerState, AppError> {
    if settings.save_path.is_file() {
        let mut player = world::load_player(&settings.save_path)?;
        player.configure(settings.game);
        if !atlas.is_main(player.map_name()) {
            let entrance =
                parent_coordinate(player.map_name()).ok_or_else(|| AppError::UnknownMap {
                    name: player.map_name().to_string(),
                })?;
            atlas.enter_child(entrance)?;
        }
        return Ok(player);
    }

    let mut player = PlayerState::new(settings.game);
    let main = atlas.main();
    player.move_to(main, main.starting_coordinate())?;
    info!(map = main.name(), position = %player.position(), "new_game_started");
    Ok(player)
}

/// One headless play session driven by text commands.
pub(crate) struct Session {
    atlas: MapAtlas,
    player: PlayerState,
    save_path: PathBuf,
    chests: Box<dyn ChestRewardPolicy>,
    prompt: Option<Prompt>,
}

impl Session {
    pub(crate) fn new(
        atlas: MapAtlas,
        player: PlayerState,
        save_path: PathBuf,
        chests: Box<dyn ChestRewardPolicy>,
    ) -> Self {
        Self {
            atlas,
            player,
            save_path,
            chests,
            prompt: None,
        }
    }

    pub(crate) fn player(&self) -> &PlayerState {
        &self.player
    }

    pub(crate) fn handle_line(&mut self, line: &str) -> Result<Reply, AppError> {
        if let Some(prompt) = self.prompt.take() {
            let answer = line.trim().to_ascii_lowercase();
            let accepted = matches!(answer.as_str(), "" | "y" | "yes");
            return Ok(self.answer(prompt, accepted));
        }
        match parse_command(line) {
            Ok(command) => self.execute(command),
            Err(error) => Ok(Reply::say(error.to_string())),
        }
    }

    fn execute(&mut self, command: Command) -> Result<Reply, AppError> {
        match command {
            Command::Move(direction) => self.step(direction),
            Command::Interact => self.interact(),
            Command::Save => Ok(self.save()),
            Command::Map => Ok(Reply::say(self.view()?)),
            Command::Status => Ok(Reply::say(self.status())),
            Command::Inventory => Ok(self.inventory()),
            Command::Use { slot } => Ok(self.use_item(slot)),
            Command::Help => Ok(Reply::say(
                "commands: n s e w (move), i (interact), map, status, inv, use <slot>, save, quit",
            )),
            Command::Quit => Ok(Reply {
                lines: vec!["Farewell.".to_string()],
                quit: true,
            }),
        }
    }

    fn active_grid(&self) -> Result<&TerrainGrid, AppError> {
        self.atlas
            .get(self.player.map_name())
            .ok_or_else(|| AppError::UnknownMap {
                name: self.player.map_name().to_string(),
            })
    }

    fn step(&mut self, direction: Direction) -> Result<Reply, AppError> {
        let (dx, dy) = direction.delta();
        let grid = self
            .atlas
            .get(self.player.map_name())
            .ok_or_else(|| AppError::UnknownMap {
                name: self.player.map_name().to_string(),
            })?;
        let target = self
            .player
            .position()
            .offset(dx, dy)
            .filter(|target| grid.contains(i64::from(target.x), i64::from(target.y)));
        let Some(target) = target.filter(|target| self.player.can_move_to(grid, *target)) else {
            return Ok(Reply::say("You can't go that way."));
        };

        let first_visit = self.player.move_to(grid, target)?;
        let config = *self.player.config();
        if first_visit {
            self.player.add_experience(config.xp.explore_xp);
        }

        let mut reply = Reply::default();
        let terrain = grid.terrain_at_coord(target);
        if terrain == TerrainKind::Lava && !self.player.immune_to(TerrainKind::Lava) {
            self.player.deduct_health(config.lava_health_damage);
            reply.push(format!(
                "The lava burns you for {} health.",
                config.lava_health_damage
            ));
            if self.player.health() == 0 {
                reply.push("You have no health left.");
            }
        }
        reply.push(self.view()?);
        Ok(reply)
    }

    fn interact(&mut self) -> Result<Reply, AppError> {
        let position = self.player.position();
        let grid = self.active_grid()?;
        match grid.terrain_at_coord(position) {
            terrain if terrain.is_portal() => self.pass_portal(),
            TerrainKind::Chest => Ok(self.open_chest()),
            TerrainKind::Ship | TerrainKind::Water => Ok(self.approach_ship()?),
            _ => Ok(Reply::say("There is nothing here to interact with.")),
        }
    }

    fn pass_portal(&mut self) -> Result<Reply, AppError> {
        let map_name = self.player.map_name().to_string();
        if self.atlas.is_main(&map_name) {
            let entrance = self.player.position();
            let child = match self.atlas.enter_child(entrance) {
                Ok(child) => child,
                Err(error) => {
                    warn!(error = %error, entrance = %entrance, "child_map_unavailable");
                    return Ok(Reply::say("The way is blocked."));
                }
            };
            let first_visit = self.player.move_to(child, child.starting_coordinate())?;
            if first_visit {
                self.player.add_experience(self.player.config().xp.explore_xp);
            }
            let mut reply = Reply::say("You step inside.");
            reply.push(self.view()?);
            return Ok(reply);
        }

        let Some(exit) = self.atlas.exit_of(&map_name) else {
            return Ok(Reply::say("There is no way out here."));
        };
        self.player.move_to(self.atlas.main(), exit)?;
        let mut reply = Reply::say("You step back outside.");
        reply.push(self.view()?);
        Ok(reply)
    }

    fn open_chest(&mut self) -> Reply {
        let map_name = self.player.map_name().to_string();
        if !self.player.interacted(&map_name, self.player.position()) {
            return Reply::say("This chest has already been opened.");
        }
        let config = *self.player.config();
        self.player.add_experience(config.xp.chest_xp);
        match self.chests.open_chest(&config) {
            ChestOutcome::Empty => Reply::say("The chest is empty."),
            ChestOutcome::Coins(coins) => {
                self.player.add_coins(coins);
                Reply::say(format!("You found {coins} coins!"))
            }
            ChestOutcome::Damage(damage) => {
                self.player.deduct_health(damage);
                Reply::say(format!("The chest was trapped! You lose {damage} health."))
            }
        }
    }

    fn approach_ship(&mut self) -> Result<Reply, AppError> {
        if self.player.is_onboard() {
            self.prompt = Some(Prompt::Disembark);
            return Ok(Reply::say("Disembark here? (y/n)"));
        }
        let grid = self.active_grid()?;
        if !self.player.vehicle_located_at(grid, self.player.position()) {
            return Ok(Reply::say("There is no ship here."));
        }
        let cost = self.player.config().ship_cost;
        if self.player.coins() < cost {
            return Ok(Reply::say(format!(
                "You can't afford to hire the ship, it costs {cost} coins."
            )));
        }
        self.prompt = Some(Prompt::HireShip);
        Ok(Reply::say(format!("Hire the ship for {cost} coins? (y/n)")))
    }

    fn answer(&mut self, prompt: Prompt, accepted: bool) -> Reply {
        match (prompt, accepted) {
            (Prompt::HireShip, true) => {
                let origin = self.player.board();
                let cost = self.player.config().ship_cost;
                self.player.deduct_coins(cost);
                info!(map = self.player.map_name(), %origin, cost, "ship_hired");
                Reply::say("The ship is yours. Set sail!")
            }
            (Prompt::HireShip, false) => Reply::say("Maybe another time."),
            (Prompt::Disembark, true) => {
                self.player.disembark();
                Reply::say("You leave the ship.")
            }
            (Prompt::Disembark, false) => Reply::say("You stay aboard."),
        }
    }

    fn save(&self) -> Reply {
        match save_player(&self.player, &self.save_path) {
            Ok(()) => Reply::say("Game saved."),
            Err(error) => {
                warn!(error = %error, "save_failed");
                Reply::say(format!("Error saving game: {error}"))
            }
        }
    }

    fn status(&self) -> String {
        let player = &self.player;
        format!(
            "map {} at {} | health {}/{} | coins {} | xp {}{}",
            player.map_name(),
            player.position(),
            player.health(),
            player.max_health(),
            player.coins(),
            player.experience(),
            if player.is_onboard() { " | aboard ship" } else { "" }
        )
    }

    fn inventory(&self) -> Reply {
        let items = self.player.items();
        if items.is_empty() {
            return Reply::say("Your pack is empty.");
        }
        let mut reply = Reply::default();
        for (slot, item) in items.items().iter().enumerate() {
            let equipped = if item.equipped { " (equipped)" } else { "" };
            reply.push(format!("{slot}: {}{equipped}", item.name));
        }
        reply
    }

    fn use_item(&mut self, slot: usize) -> Reply {
        match self.player.apply_item(slot) {
            Ok(true) => Reply::say("Done."),
            Ok(false) => Reply::say("Nothing changes."),
            Err(error) => Reply::say(error.to_string()),
        }
    }

    /// The page of the active map holding the player, with vehicles overlaid.
    pub(crate) fn view(&self) -> Result<String, AppError> {
        let grid = self.active_grid()?;
        Ok(render_view(grid, &self.player, VIEW_WIDTH, VIEW_HEIGHT))
    }
}

pub(crate) fn render_view(
    grid: &TerrainGrid,
    player: &PlayerState,
    width: u32,
    height: u32,
) -> String {
    let position = player.position();
    let left = (position.x / width) * width;
    let top = (position.y / height) * height;
    let mut output = String::new();
    let mut last_row: Option<u32> = None;
    grid.walk(
        i64::from(left),
        i64::from(top),
        width,
        height,
        |col, row, terrain| {
            if last_row.is_some_and(|last| last != row) {
                output.push('\n');
            }
            last_row = Some(row);
            let here = Coordinate::new(col, row);
            let glyph = if here == position {
                PLAYER_GLYPH
            } else {
                displayed_terrain(grid, player, here, terrain).glyph()
            };
            output.push(glyph);
        },
    );
    output
}

fn displayed_terrain(
    grid: &TerrainGrid,
    player: &PlayerState,
    coord: Coordinate,
    terrain: TerrainKind,
) -> TerrainKind {
    match terrain {
        TerrainKind::Ship if !player.vehicle_located_at(grid, coord) => TerrainKind::Water,
        TerrainKind::Water if player.vehicle_located_at(grid, coord) => TerrainKind::Ship,
        other => other,
    }
}
