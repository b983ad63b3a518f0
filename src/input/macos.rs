//! macOS host binding: a session-level `CGEventTap` filtered to key-down events.
//!
//! The tap needs the Accessibility (or Input Monitoring) permission; without it
//! `CGEventTapCreate` returns null. Events are always handed back to the system.

use std::ffi::c_void;
use std::ptr::null_mut;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use core_foundation_sys::base::{CFRelease, kCFAllocatorDefault};
use core_foundation_sys::mach_port::{CFMachPortCreateRunLoopSource, CFMachPortRef};
use core_foundation_sys::runloop::{
    CFRunLoopAddSource, CFRunLoopGetCurrent, CFRunLoopRef, CFRunLoopRemoveSource,
    CFRunLoopRunInMode, CFRunLoopSourceRef, kCFRunLoopCommonModes, kCFRunLoopDefaultMode,
};
use core_graphics::event::{CGEventFlags, CGEventType};
use log::{debug, info};

use super::{EVENT_LOOP_TICK, InterceptError, Key, KeyEventHandler, Modifiers};

type TapCallback = extern "C" fn(
    proxy: *mut c_void,
    event_type: u32,
    event: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: TapCallback,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    fn CGEventGetFlags(event: *mut c_void) -> u64;
    fn CGEventGetIntegerValueField(event: *mut c_void, field: u32) -> i64;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFMachPortInvalidate(port: CFMachPortRef);
}

// CGEventTapLocation / CGEventTapPlacement / CGEventTapOptions
const SESSION_EVENT_TAP: u32 = 1;
const HEAD_INSERT_EVENT_TAP: u32 = 0;
const TAP_OPTION_DEFAULT: u32 = 0;

// Pseudo event types delivered when the system turns the tap off.
const TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
const TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

// CGEventField
const KEYBOARD_EVENT_KEYCODE: u32 = 9;

// Virtual key codes (ANSI layout positions)
const KEY_C: i64 = 0x08;
const KEY_LEFT: i64 = 0x7B;
const KEY_RIGHT: i64 = 0x7C;
const KEY_DOWN: i64 = 0x7D;
const KEY_UP: i64 = 0x7E;

/// Handed to the tap callback through `user_info`.
struct TapContext {
    handler: Arc<dyn KeyEventHandler>,
    tap: AtomicPtr<c_void>,
}

/// Owns the tap and its run-loop source. Dropping it disables the tap and
/// removes it from the run loop it was added to.
pub struct InterceptGuard {
    tap: CFMachPortRef,
    source: CFRunLoopSourceRef,
    run_loop: CFRunLoopRef,
    // Boxed so the address given to the callback stays fixed; freed last.
    context: Box<TapContext>,
}

impl Drop for InterceptGuard {
    fn drop(&mut self) {
        unsafe {
            CGEventTapEnable(self.tap, false);
            CFRunLoopRemoveSource(self.run_loop, self.source, kCFRunLoopCommonModes);
            CFMachPortInvalidate(self.tap);
            CFRelease(self.source as *const c_void);
            CFRelease(self.tap as *const c_void);
        }
        self.context.tap.store(null_mut(), Ordering::Release);
        info!("Event tap removed");
    }
}

pub fn install(handler: Arc<dyn KeyEventHandler>) -> Result<InterceptGuard, InterceptError> {
    let context = Box::new(TapContext {
        handler,
        tap: AtomicPtr::new(null_mut()),
    });
    let user_info = &*context as *const TapContext as *mut c_void;
    let mask = 1u64 << (CGEventType::KeyDown as u32);

    unsafe {
        let tap = CGEventTapCreate(
            SESSION_EVENT_TAP,
            HEAD_INSERT_EVENT_TAP,
            TAP_OPTION_DEFAULT,
            mask,
            tap_callback,
            user_info,
        );
        if tap.is_null() {
            return Err(InterceptError::PermissionDenied(
                "CGEventTapCreate returned null; grant Accessibility access to this process"
                    .to_string(),
            ));
        }

        let source = CFMachPortCreateRunLoopSource(kCFAllocatorDefault, tap, 0);
        if source.is_null() {
            CFMachPortInvalidate(tap);
            CFRelease(tap as *const c_void);
            return Err(InterceptError::Os(
                "could not create a run loop source for the event tap".to_string(),
            ));
        }

        let run_loop = CFRunLoopGetCurrent();
        CFRunLoopAddSource(run_loop, source, kCFRunLoopCommonModes);
        context.tap.store(tap as *mut c_void, Ordering::Release);
        CGEventTapEnable(tap, true);
        info!("Event tap installed (session, keyDown)");

        Ok(InterceptGuard {
            tap,
            source,
            run_loop,
            context,
        })
    }
}

pub fn run_event_loop(shutdown: &AtomicBool) {
    debug!("Entering CFRunLoop");
    while !shutdown.load(Ordering::Acquire) {
        unsafe {
            CFRunLoopRunInMode(kCFRunLoopDefaultMode, EVENT_LOOP_TICK.as_secs_f64(), 0);
        }
    }
    debug!("Left CFRunLoop");
}

extern "C" fn tap_callback(
    _proxy: *mut c_void,
    event_type: u32,
    event: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void {
    if user_info.is_null() {
        return event;
    }
    let context = unsafe { &*(user_info as *const TapContext) };

    if event_type == TAP_DISABLED_BY_TIMEOUT || event_type == TAP_DISABLED_BY_USER_INPUT {
        let tap = context.tap.load(Ordering::Acquire);
        if !tap.is_null() {
            unsafe { CGEventTapEnable(tap as CFMachPortRef, true) };
        }
        return event;
    }
    if event_type != CGEventType::KeyDown as u32 {
        return event;
    }

    let (flags, code) = unsafe {
        (
            CGEventGetFlags(event),
            CGEventGetIntegerValueField(event, KEYBOARD_EVENT_KEYCODE),
        )
    };
    let modifiers = Modifiers {
        primary: flags & CGEventFlags::CGEventFlagCommand.bits() != 0,
        alt: flags & CGEventFlags::CGEventFlagAlternate.bits() != 0,
        shift: flags & CGEventFlags::CGEventFlagShift.bits() != 0,
    };

    if context.handler.on_key_event(modifiers, translate(code)) {
        null_mut()
    } else {
        event
    }
}

fn translate(code: i64) -> Key {
    match code {
        KEY_C => Key::C,
        KEY_LEFT => Key::Left,
        KEY_RIGHT => Key::Right,
        KEY_DOWN => Key::Down,
        KEY_UP => Key::Up,
        other => Key::Other(other as u32),
    }
}
