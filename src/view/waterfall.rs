use super::{Info, View};

use libc::{c_int, c_void};
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2_sys as sys;
use std::ptr;

/// Scrolling waterfall: the persistent pixel surface plus the streaming
/// texture it is uploaded through. The texture belongs to the canvas
/// renderer, which destroys its textures on drop.
pub struct Waterfall {
    pub view: Canvas<Window>,
    surface: crate::surface::ScrollSurface,
    tex: *mut sys::SDL_Texture,
}

impl Waterfall {
    pub fn new(view: Canvas<Window>) -> Waterfall {
        Waterfall {
            view,
            surface: crate::surface::ScrollSurface::new(0, 0),
            tex: ptr::null_mut(),
        }
    }

    fn recreate_texture(&mut self, width: u32, height: u32) {
        unsafe {
            if !self.tex.is_null() {
                sys::SDL_DestroyTexture(self.tex);
            }
            // ABGR8888 packs to R,G,B,A byte order in memory on
            // little-endian, matching the surface layout
            self.tex = sys::SDL_CreateTexture(
                self.view.raw(),
                PixelFormatEnum::ABGR8888 as u32,
                sys::SDL_TextureAccess::SDL_TEXTUREACCESS_STREAMING as c_int,
                width as c_int,
                height as c_int,
            );
        }
        assert!(!self.tex.is_null(), "creating waterfall texture");
    }
}

impl View for Waterfall {
    fn render(&mut self, info: &Info) {
        let _g = hprof::enter("Waterfall::render");
        let (width, height) = self.view.output_size().expect("getting size");
        if width == 0 || height == 0 {
            return;
        }

        if (width, height) != (self.surface.width(), self.surface.height()) {
            self.surface.resize(width, height);
            self.recreate_texture(width, height);
        }

        if let Some(column) = info.column {
            self.surface.write_column(column);
        }

        unsafe {
            sys::SDL_UpdateTexture(
                self.tex,
                ptr::null(),
                self.surface.pixels().as_ptr() as *const c_void,
                (width * 4) as c_int,
            );
            sys::SDL_RenderCopy(self.view.raw(), self.tex, ptr::null(), ptr::null());
        }
        self.view.present();
    }

    fn requested_height(&self) -> u32 {
        self.view.output_size().expect("getting size").1
    }
}
