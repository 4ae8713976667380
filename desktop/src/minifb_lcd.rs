use std::{
    cell::RefCell,
    ops::ControlFlow,
    rc::Rc,
    time::{Duration, Instant},
};

use log::info;
use planedelta_core::{
    device::{Device, FRAMEBUFFER_BASE, FRAMEBUFFER_SPAN, Plane},
    geometry::{HEIGHT, ROW_STRIDE, VISIBLE_BYTES, WIDTH},
    player::Pacer,
};

const DISPLAY_BUFFER_SIZE: usize = WIDTH * HEIGHT;

/// Window colours for level indices 0..=3, lightest to darkest.
const PALETTE: [u32; 4] = [0xFFC7D3B5, 0xFF8D9A7E, 0xFF515C48, 0xFF1A2016];

/// LCD emulator: controller memory behind the register interface, shown in a `minifb` window.
pub struct MinifbLcd {
    selected: Option<Plane>,
    // Emulated controller memory, one bank per plane
    memory: Box<[[u8; FRAMEBUFFER_SPAN]; 2]>,
    // Actual display buffer
    display_buffer: Box<[u32; DISPLAY_BUFFER_SIZE]>,
    window: minifb::Window,
    writes: usize,
}

impl MinifbLcd {
    pub fn new(scale: minifb::Scale) -> Self {
        let options = minifb::WindowOptions {
            borderless: false,
            title: true,
            resize: false,
            scale,
            ..minifb::WindowOptions::default()
        };
        let mut window = minifb::Window::new("planedelta", WIDTH, HEIGHT, options)
            .unwrap_or_else(|e| {
                panic!("Unable to open window: {}", e);
            });
        // Pacing is done by the player.
        window.set_target_fps(0);

        let mut ret = Self {
            selected: None,
            memory: Box::new([[0; FRAMEBUFFER_SPAN]; 2]),
            display_buffer: Box::new([0; DISPLAY_BUFFER_SIZE]),
            window,
            writes: 0,
        };
        ret.display_buffer.fill(PALETTE[0]);
        ret
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape)
    }

    pub fn present(&mut self) {
        if let Err(e) = self
            .window
            .update_with_buffer(&*self.display_buffer, WIDTH, HEIGHT)
        {
            log::warn!("window update failed: {e}");
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Redraw the eight pixels behind one controller byte.
    fn refresh(&mut self, offset: usize) {
        let (row, column) = (offset / ROW_STRIDE, offset % ROW_STRIDE);
        if row >= HEIGHT || column >= VISIBLE_BYTES {
            return;
        }
        let low = self.memory[Plane::Bit0 as usize][offset];
        let high = self.memory[Plane::Bit4 as usize][offset];
        for bit in 0..8 {
            let level = ((high >> (7 - bit)) & 1) << 1 | ((low >> (7 - bit)) & 1);
            self.display_buffer[row * WIDTH + column * 8 + bit] = PALETTE[level as usize];
        }
    }
}

impl Device for MinifbLcd {
    fn select_plane(&mut self, plane: Plane) {
        // A new pass starts: show what the previous one drew.
        if self.selected.is_some() {
            self.present();
        }
        self.selected = Some(plane);
    }

    fn write(&mut self, address: u16, value: u8) {
        let Some(plane) = self.selected else {
            log::warn!("write to {address:#06x} before plane select");
            return;
        };
        let Some(offset) = address.checked_sub(FRAMEBUFFER_BASE) else {
            log::warn!("write to {address:#06x} outside the framebuffer");
            return;
        };
        let offset = offset as usize;
        self.memory[plane as usize][offset] = value;
        self.writes += 1;
        self.refresh(offset);
    }
}

/// Handle shared by the player's device and pacer roles.
#[derive(Clone)]
pub struct SharedLcd(pub Rc<RefCell<MinifbLcd>>);

impl SharedLcd {
    pub fn new(lcd: MinifbLcd) -> Self {
        Self(Rc::new(RefCell::new(lcd)))
    }
}

impl Device for SharedLcd {
    fn select_plane(&mut self, plane: Plane) {
        self.0.borrow_mut().select_plane(plane)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.0.borrow_mut().write(address, value)
    }
}

/// Holds each frame on screen for its delay while keeping the window responsive.
/// Closing the window or pressing Escape stops playback.
pub struct WindowPacer {
    lcd: SharedLcd,
}

impl WindowPacer {
    pub fn new(lcd: SharedLcd) -> Self {
        Self { lcd }
    }
}

const POLL: Duration = Duration::from_millis(10);

impl Pacer for WindowPacer {
    fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        let deadline = Instant::now() + delay;
        let mut lcd = self.lcd.0.borrow_mut();
        lcd.present();
        loop {
            if !lcd.is_open() {
                info!("window closed");
                return ControlFlow::Break(());
            }
            let now = Instant::now();
            if now >= deadline {
                return ControlFlow::Continue(());
            }
            std::thread::sleep(POLL.min(deadline - now));
            lcd.window.update();
        }
    }
}
