use rand::seq::SliceRandom;
use rand::Rng;

const GRAVITY: f64 = 15.0;
const DURATION_SECS: f64 = 4.0;

/// One confetti glyph, either free-falling or flying into place as part
/// of the banner text
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    age: f64,
    max_age: f64,
    pub is_text: bool,
    target_x: f64,
    target_y: f64,
}

impl Particle {
    fn confetti<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *['✨', '🎉', '⭐', '🎨', '✏', '🖌', '💫']
                .choose(rng)
                .unwrap_or(&'✨'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn banner_char<R: Rng>(
        x: f64,
        y: f64,
        target_x: f64,
        target_y: f64,
        symbol: char,
        rng: &mut R,
    ) -> Self {
        Self {
            x,
            y,
            vel_x: target_x - x,
            vel_y: target_y - y,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: DURATION_SECS,
            is_text: true,
            target_x,
            target_y,
        }
    }

    /// Remaining life as a 1.0 -> 0.0 factor, for fade-out styling
    pub fn fade(&self) -> f64 {
        (1.0 - self.age / self.max_age).max(0.0)
    }

    /// Step one timeslice; false once the particle has aged out
    fn step(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 1.0 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_x *= 0.95;
                self.vel_y *= 0.95;
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }
        self.age += dt;
        self.age < self.max_age
    }
}

/// Win-screen confetti. Driven from the tick loop so it needs no clock
/// of its own.
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    elapsed: f64,
    pub is_active: bool,
    cols: f64,
    rows: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            elapsed: 0.0,
            is_active: false,
            cols: 80.0,
            rows: 24.0,
        }
    }

    /// Kick off the banner and confetti shower, sized to the terminal
    pub fn start(&mut self, cols: u16, rows: u16) {
        let mut rng = rand::thread_rng();
        self.particles.clear();
        self.elapsed = 0.0;
        self.is_active = true;
        self.cols = cols as f64;
        self.rows = rows as f64;

        let center_x = self.cols / 2.0;
        let center_y = self.rows / 2.0;

        let banners = ["YOU WON!", "ART GENIUS!", "MASTERFUL!", "WHAT A HAND!"];
        let banner = banners.choose(&mut rng).unwrap_or(&"YOU WON!");
        self.spawn_banner(banner, center_x, center_y, &mut rng);

        for _ in 0..30 {
            let x = center_x + rng.gen_range(-18.0..18.0);
            let y = center_y + rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::confetti(x, y, &mut rng));
        }
    }

    fn spawn_banner<R: Rng>(&mut self, text: &str, center_x: f64, center_y: f64, rng: &mut R) {
        let char_width = 2.0;
        let text_width = (text.chars().count() as f64 - 1.0) * char_width;
        let left = center_x - text_width / 2.0;

        for (i, ch) in text.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let target_x = left + i as f64 * char_width;
            let target_y = center_y - 2.0;
            let x = center_x + rng.gen_range(-10.0..10.0);
            let y = center_y + rng.gen_range(-5.0..5.0);
            self.particles
                .push(Particle::banner_char(x, y, target_x, target_y, ch, rng));
        }
    }

    /// Advance by `dt` seconds; confetti that leaves the terminal is
    /// culled, banner glyphs stay until the animation ends
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= DURATION_SECS {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let cols = self.cols;
        let rows = self.rows;
        self.particles.retain_mut(|p| {
            let alive = p.step(dt);
            if p.is_text {
                alive
            } else {
                let buffer = 5.0;
                let gone = p.y > rows + buffer || p.x < -buffer || p.x > cols + buffer;
                alive && !gone
            }
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
