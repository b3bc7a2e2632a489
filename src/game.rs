use log::{debug, trace};
use std::collections::VecDeque;

// ============================================================================
// Configuration
// ============================================================================

// Timing (in milliseconds), 30 ticks per second
pub const TICK_MS: u64 = 33;

/// Built-in level. Codes per `Tile::from_raw`; the surrounding ring of 2s is
/// the Unbreakable border every level is expected to carry.
pub const DEFAULT_LEVEL: [[u8; 8]; 6] = [
    [2, 2, 2, 2, 2, 2, 2, 2],
    [2, 3, 0, 1, 1, 2, 0, 2],
    [2, 4, 2, 6, 1, 2, 0, 2],
    [2, 8, 4, 1, 1, 2, 0, 2],
    [2, 4, 1, 1, 1, 9, 0, 2],
    [2, 2, 2, 2, 2, 2, 2, 2],
];

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyColor {
    Yellow,
    Blue,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FallingState {
    Resting,
    Falling,
}

impl FallingState {
    pub fn is_falling(self) -> bool {
        matches!(self, FallingState::Falling)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Air,
    Flux,
    Unbreakable,
    Player,
    Stone(FallingState),
    Box(FallingState),
    Key(KeyColor),
    Lock(KeyColor),
}

impl Tile {
    /// Maps a raw level code to a tile. An unknown code is a level-authoring
    /// error and aborts loading; it can never be triggered by gameplay.
    pub fn from_raw(code: u8) -> Tile {
        match code {
            0 => Tile::Air,
            1 => Tile::Flux,
            2 => Tile::Unbreakable,
            3 => Tile::Player,
            4 => Tile::Stone(FallingState::Resting),
            5 => Tile::Stone(FallingState::Falling),
            6 => Tile::Box(FallingState::Resting),
            7 => Tile::Box(FallingState::Falling),
            8 => Tile::Key(KeyColor::Yellow),
            9 => Tile::Lock(KeyColor::Yellow),
            10 => Tile::Key(KeyColor::Blue),
            11 => Tile::Lock(KeyColor::Blue),
            _ => panic!("unknown raw tile code {code}"),
        }
    }

    pub fn is_air(self) -> bool {
        matches!(self, Tile::Air)
    }

    pub fn is_lock(self, color: KeyColor) -> bool {
        matches!(self, Tile::Lock(c) if c == color)
    }

    /// The state a stone or box sitting directly on top of this tile adopts:
    /// only Air lets it keep falling.
    pub fn block_on_top_state(self) -> FallingState {
        match self {
            Tile::Air => FallingState::Falling,
            _ => FallingState::Resting,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Input {
    Left,
    Right,
    Up,
    Down,
}

impl Input {
    pub fn handle(self, map: &mut Map, player: &mut Player) {
        match self {
            Input::Left => player.move_horizontal(map, -1),
            Input::Right => player.move_horizontal(map, 1),
            Input::Up => player.move_vertical(map, -1),
            Input::Down => player.move_vertical(map, 1),
        }
    }
}

// ============================================================================
// Map
// ============================================================================

/// The level grid. Owns every tile; all mutation goes through the operations
/// below so the Player-marker cell and falling states stay consistent.
///
/// Coordinates are (x, y) with y indexing rows. Levels carry an Unbreakable
/// border, so every operation assumes its indices are in bounds; going out of
/// bounds is a programming error and panics.
pub struct Map {
    tiles: Vec<Vec<Tile>>,
}

impl Map {
    pub fn from_raw<R: AsRef<[u8]>>(raw: &[R]) -> Self {
        let tiles: Vec<Vec<Tile>> = raw
            .iter()
            .map(|row| row.as_ref().iter().map(|&c| Tile::from_raw(c)).collect())
            .collect();
        debug!(
            "loaded {}x{} level",
            tiles.first().map_or(0, Vec::len),
            tiles.len()
        );
        Self { tiles }
    }

    pub fn width(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, x: usize, y: usize) -> Tile {
        self.tiles[y][x]
    }

    pub fn find_player(&self) -> Option<(usize, usize)> {
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, &tile) in row.iter().enumerate() {
                if tile == Tile::Player {
                    return Some((x, y));
                }
            }
        }
        None
    }

    pub fn block_on_top_state(&self, x: usize, y: usize) -> FallingState {
        self.tiles[y][x].block_on_top_state()
    }

    /// Replaces every tile satisfying the predicate with Air. Used by key
    /// pickup to clear all matching locks.
    pub fn remove(&mut self, should_remove: impl Fn(Tile) -> bool) {
        for row in &mut self.tiles {
            for cell in row {
                if should_remove(*cell) {
                    *cell = Tile::Air;
                }
            }
        }
    }

    /// One physics pass. Sweeps bottom row to top row, left to right within a
    /// row, so a tile that drops into a cell this tick lands in an
    /// already-visited row and is not processed twice.
    pub fn update(&mut self) {
        for y in (0..self.tiles.len()).rev() {
            for x in 0..self.tiles[y].len() {
                match self.tiles[y][x] {
                    Tile::Stone(_) => self.update_falling(x, y, Tile::Stone),
                    Tile::Box(_) => self.update_falling(x, y, Tile::Box),
                    _ => {}
                }
            }
        }
    }

    fn update_falling(&mut self, x: usize, y: usize, rebuild: fn(FallingState) -> Tile) {
        // New state comes from the tile below, then the new state acts.
        match self.block_on_top_state(x, y + 1) {
            FallingState::Falling => self.drop_tile(rebuild(FallingState::Falling), x, y),
            FallingState::Resting => self.tiles[y][x] = rebuild(FallingState::Resting),
        }
    }

    /// Unconditionally relocates `tile` one cell down. Only called for a tile
    /// that is currently Falling.
    pub fn drop_tile(&mut self, tile: Tile, x: usize, y: usize) {
        self.tiles[y + 1][x] = tile;
        self.tiles[y][x] = Tile::Air;
    }

    pub fn move_player(&mut self, x: usize, y: usize, newx: usize, newy: usize) {
        self.tiles[y][x] = Tile::Air;
        self.tiles[newy][newx] = Tile::Player;
    }

    /// Resolves a horizontal step: the tile at the destination cell decides
    /// the outcome.
    pub fn move_horizontal(&mut self, player: &mut Player, x: usize, y: usize, dx: i32) {
        let destx = (x as i32 + dx) as usize;
        trace!("move_horizontal into {:?}", self.tiles[y][destx]);
        match self.tiles[y][destx] {
            Tile::Air | Tile::Flux => player.move_by(self, dx, 0),
            Tile::Key(color) => {
                debug!("picked up {color:?} key");
                self.remove(|t| t.is_lock(color));
                player.move_by(self, dx, 0);
            }
            tile @ (Tile::Stone(FallingState::Resting) | Tile::Box(FallingState::Resting)) => {
                player.push_horizontal(self, tile, dx);
            }
            // Falling stones and boxes reject pushes; the rest are solid.
            Tile::Stone(FallingState::Falling)
            | Tile::Box(FallingState::Falling)
            | Tile::Unbreakable
            | Tile::Player
            | Tile::Lock(_) => {}
        }
    }

    pub fn move_vertical(&mut self, player: &mut Player, x: usize, y: usize, dy: i32) {
        let desty = (y as i32 + dy) as usize;
        trace!("move_vertical into {:?}", self.tiles[desty][x]);
        match self.tiles[desty][x] {
            Tile::Air | Tile::Flux => player.move_by(self, 0, dy),
            Tile::Key(color) => {
                debug!("picked up {color:?} key");
                self.remove(|t| t.is_lock(color));
                player.move_by(self, 0, dy);
            }
            // Stones and boxes cannot be pushed vertically.
            Tile::Stone(_) | Tile::Box(_) | Tile::Unbreakable | Tile::Player | Tile::Lock(_) => {}
        }
    }

    /// Push rule: the cell two steps over must be Air and the cell below the
    /// one-step destination must be non-Air, so a stone can only be pushed
    /// onto a supported landing spot. On success the pushed tile lands two
    /// cells over and the player steps into the vacated cell.
    pub fn push_horizontal(&mut self, player: &mut Player, tile: Tile, x: usize, y: usize, dx: i32) {
        let destx = (x as i32 + dx) as usize;
        let beyondx = (x as i32 + 2 * dx) as usize;
        if self.tiles[y][beyondx].is_air() && !self.tiles[y + 1][destx].is_air() {
            self.tiles[y][beyondx] = tile;
            player.move_to(self, destx, y);
        }
    }
}

// ============================================================================
// Player
// ============================================================================

/// The player's tracked cell. The map marks the same cell with `Tile::Player`;
/// every relocation goes through `move_to` so the two never diverge.
pub struct Player {
    x: usize,
    y: usize,
}

impl Player {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn move_horizontal(&mut self, map: &mut Map, dx: i32) {
        let (x, y) = (self.x, self.y);
        map.move_horizontal(self, x, y, dx);
    }

    pub fn move_vertical(&mut self, map: &mut Map, dy: i32) {
        let (x, y) = (self.x, self.y);
        map.move_vertical(self, x, y, dy);
    }

    /// Unconditional relocation; only called once the destination tile has
    /// validated the move.
    pub fn move_by(&mut self, map: &mut Map, dx: i32, dy: i32) {
        let newx = (self.x as i32 + dx) as usize;
        let newy = (self.y as i32 + dy) as usize;
        self.move_to(map, newx, newy);
    }

    pub fn move_to(&mut self, map: &mut Map, newx: usize, newy: usize) {
        map.move_player(self.x, self.y, newx, newy);
        self.x = newx;
        self.y = newy;
    }

    pub fn push_horizontal(&mut self, map: &mut Map, tile: Tile, dx: i32) {
        let (x, y) = (self.x, self.y);
        map.push_horizontal(self, tile, x, y, dx);
    }
}

// ============================================================================
// Game
// ============================================================================

/// A simulation session: the map, the player, and the pending-input buffer.
pub struct Game {
    pub map: Map,
    pub player: Player,
    inputs: VecDeque<Input>,
}

impl Game {
    pub fn from_raw<R: AsRef<[u8]>>(raw: &[R]) -> Self {
        let map = Map::from_raw(raw);
        let (x, y) = map.find_player().expect("level has no player tile");
        Self {
            map,
            player: Player::new(x, y),
            inputs: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, input: Input) {
        self.inputs.push_back(input);
    }

    /// One tick: drains every queued input in arrival order (FIFO), then runs
    /// one physics pass over the map. All inputs resolve before any tile
    /// falls.
    pub fn tick(&mut self) {
        while let Some(input) = self.inputs.pop_front() {
            input.handle(&mut self.map, &mut self.player);
        }
        self.map.update();
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::from_raw(&DEFAULT_LEVEL)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    // Raw level codes, named so test levels read as diagrams.
    pub const AIR: u8 = 0;
    pub const FLUX: u8 = 1;
    pub const WALL: u8 = 2;
    pub const PLAYER: u8 = 3;
    pub const STONE: u8 = 4;
    pub const FALLING_STONE: u8 = 5;
    pub const BOX: u8 = 6;
    pub const FALLING_BOX: u8 = 7;
    pub const KEY_YELLOW: u8 = 8;
    pub const LOCK_YELLOW: u8 = 9;
    pub const KEY_BLUE: u8 = 10;
    pub const LOCK_BLUE: u8 = 11;

    pub fn game_from(raw: &[&[u8]]) -> Game {
        Game::from_raw(raw)
    }
}
