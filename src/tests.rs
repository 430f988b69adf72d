// virtegl/src/tests.rs
//
//! Unit tests.

use crate::egl;
use crate::egl::types::{EGLAttrib, EGLNativeWindowType, EGLenum, EGLint};
use crate::platform::egl::ffi::*;
use crate::platform::egl::{CurrentNativeContext, DepthStencilFormat, DisplayEGL};
use crate::platform::egl::{DisplayExtensions, NativeEGL, NativeWindow, RenderTargetFormat};
use crate::platform::fake::{FakeCall, FakeConfig, FakeEGL};
use crate::{AttributeMap, DisplayBackend, Error, GLVersion, WindowingApiError};

use euclid::default::Size2D;
use std::ptr;
use std::sync::Arc;
use std::thread;

fn attributes(pairs: &[(EGLenum, EGLAttrib)]) -> AttributeMap {
    pairs
        .iter()
        .map(|&(attribute, value)| (attribute as EGLint, value))
        .collect()
}

fn display_attributes(virtualized: bool) -> AttributeMap {
    let virtualized = if virtualized { egl::TRUE } else { egl::FALSE };
    attributes(&[(
        EGL_PLATFORM_ANGLE_CONTEXT_VIRTUALIZATION_ANGLE,
        virtualized as EGLAttrib,
    )])
}

fn new_display(fake: &Arc<FakeEGL>) -> DisplayEGL {
    DisplayEGL::from_native_egl(fake.clone())
}

fn initialized_display(fake: &Arc<FakeEGL>, virtualized: bool) -> DisplayEGL {
    let mut display = new_display(fake);
    display.initialize(&display_attributes(virtualized)).unwrap();
    display
}

fn version_attributes(major: EGLint, minor: EGLint, robust: bool) -> Vec<EGLint> {
    let mut list = vec![
        EGL_CONTEXT_MAJOR_VERSION as EGLint,
        major,
        EGL_CONTEXT_MINOR_VERSION as EGLint,
        minor,
    ];
    if robust {
        list.extend([
            EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY as EGLint,
            EGL_LOSE_CONTEXT_ON_RESET as EGLint,
        ]);
    }
    list.push(egl::NONE as EGLint);
    list
}

fn attribute_value(list: &[EGLint], attribute: EGLenum) -> Option<EGLint> {
    list.chunks(2)
        .find(|pair| pair.len() == 2 && pair[0] == attribute as EGLint)
        .map(|pair| pair[1])
}

fn created_context_attributes(calls: &[FakeCall]) -> Vec<Vec<EGLint>> {
    calls
        .iter()
        .filter_map(|call| match call {
            FakeCall::CreateContext { attributes, .. } => Some(attributes.clone()),
            _ => None,
        })
        .collect()
}

fn make_current_calls(fake: &FakeEGL) -> Vec<FakeCall> {
    fake.take_calls()
        .into_iter()
        .filter(FakeCall::is_make_current)
        .collect()
}

#[test]
fn test_initialize_binds_the_display_renderer_to_the_mock_surface() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, true);

    let calls = fake.calls();
    assert_eq!(calls[0], FakeCall::Initialize);
    assert_eq!(calls[1], FakeCall::BindApi(egl::OPENGL_ES_API));
    assert_eq!(calls.last(), Some(&FakeCall::LoadGLFunctions));
    assert_eq!(created_context_attributes(&calls).len(), 3);

    let renderer = display.renderer().unwrap();
    assert_ne!(display.mock_surface(), egl::NO_SURFACE);
    assert_eq!(renderer.attributes(), &version_attributes(3, 0, false)[..]);
    assert_eq!(display.max_supported_es_version(), Ok(GLVersion::new(3, 0)));
    assert_eq!(
        display.current_native_context(),
        CurrentNativeContext {
            surface: display.mock_surface(),
            context: renderer.egl_context(),
            is_external_context: false,
        }
    );
    assert_eq!(
        calls.iter().filter(|call| call.is_make_current()).count(),
        1,
        "the display renderer is bound once and left bound"
    );
}

#[test]
fn test_robust_failure_falls_back_before_older_versions() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_EXT_create_context_robustness");
    let robust = EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY as EGLint;
    fake.reject_contexts(move |attributes| attributes.contains(&robust));

    let display = initialized_display(&fake, true);

    assert_eq!(
        created_context_attributes(&fake.calls()),
        vec![
            version_attributes(3, 2, true),
            version_attributes(3, 2, false),
            version_attributes(3, 1, true),
            version_attributes(3, 1, false),
            version_attributes(3, 0, true),
            version_attributes(3, 0, false),
        ]
    );
    assert_eq!(
        display.renderer().unwrap().attributes(),
        &version_attributes(3, 0, false)[..]
    );
}

#[test]
fn test_video_memory_purge_rides_on_robust_contexts() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_EXT_create_context_robustness EGL_NV_robustness_video_memory_purge");
    fake.set_max_context_version(GLVersion::new(3, 1));

    let display = initialized_display(&fake, true);

    let attributes = display.renderer().unwrap().attributes().to_vec();
    assert_eq!(attribute_value(&attributes, EGL_CONTEXT_MAJOR_VERSION), Some(3));
    assert_eq!(attribute_value(&attributes, EGL_CONTEXT_MINOR_VERSION), Some(1));
    assert_eq!(
        attribute_value(&attributes, EGL_CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY),
        Some(EGL_LOSE_CONTEXT_ON_RESET as EGLint)
    );
    assert_eq!(
        attribute_value(&attributes, EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV),
        Some(egl::TRUE as EGLint)
    );
    assert!(display
        .generate_extensions()
        .contains(DisplayExtensions::ROBUSTNESS_VIDEO_MEMORY_PURGE_NV));
}

#[test]
fn test_explicit_version_request_is_the_only_attempt() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = new_display(&fake);
    let mut requested = display_attributes(true);
    requested.insert(EGL_PLATFORM_ANGLE_MAX_VERSION_MAJOR_ANGLE as EGLint, 2);
    requested.insert(EGL_PLATFORM_ANGLE_MAX_VERSION_MINOR_ANGLE as EGLint, 0);
    display.initialize(&requested).unwrap();

    assert_eq!(
        created_context_attributes(&fake.calls()),
        vec![version_attributes(2, 0, false)]
    );
    assert_eq!(display.max_supported_es_version(), Ok(GLVersion::new(2, 0)));
}

#[test]
fn test_legacy_driver_only_gets_client_version_2() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_egl_version(GLVersion::new(1, 4));
    let display = initialized_display(&fake, true);

    let calls = fake.calls();
    let chosen = calls
        .iter()
        .find_map(|call| match call {
            FakeCall::ChooseConfig { attributes, .. } => Some(attributes.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        attribute_value(&chosen, egl::RENDERABLE_TYPE),
        Some(egl::OPENGL_ES2_BIT as EGLint)
    );
    assert_eq!(
        created_context_attributes(&calls),
        vec![vec![egl::CONTEXT_CLIENT_VERSION as EGLint, 2, egl::NONE as EGLint]]
    );
    drop(display);

    // Asking a legacy driver for ES 3 fails without touching the driver, and cleans up.
    let fake = Arc::new(FakeEGL::new());
    fake.set_egl_version(GLVersion::new(1, 4));
    let mut display = new_display(&fake);
    let mut requested = display_attributes(true);
    requested.insert(EGL_PLATFORM_ANGLE_MAX_VERSION_MAJOR_ANGLE as EGLint, 3);
    requested.insert(EGL_PLATFORM_ANGLE_MAX_VERSION_MINOR_ANGLE as EGLint, 0);
    assert_eq!(
        display.initialize(&requested),
        Err(Error::UnsupportedGLVersion(GLVersion::new(3, 0)))
    );
    let calls = fake.calls();
    assert!(!calls.iter().any(FakeCall::is_create_context));
    assert_eq!(calls.last(), Some(&FakeCall::Terminate));
    assert_eq!(fake.live_surfaces(), 0);
    assert!(!display.is_initialized());
}

#[test]
fn test_initialize_failures() {
    let fake = Arc::new(FakeEGL::new());
    fake.fail_initialize(true);
    assert_eq!(
        new_display(&fake).initialize(&display_attributes(true)),
        Err(Error::DisplayInitializationFailed(WindowingApiError::NotInitialized))
    );
    assert_eq!(fake.calls(), vec![FakeCall::Initialize]);

    let fake = Arc::new(FakeEGL::new());
    fake.set_egl_version(GLVersion::new(1, 3));
    assert_eq!(
        new_display(&fake).initialize(&display_attributes(true)),
        Err(Error::UnsupportedEGLVersion(GLVersion::new(1, 3)))
    );
    assert_eq!(fake.calls(), vec![FakeCall::Initialize, FakeCall::Terminate]);

    let fake = Arc::new(FakeEGL::new());
    fake.set_configs(vec![FakeConfig::new(1, [5, 6, 5, 0], 16, 0)]);
    assert_eq!(
        new_display(&fake).initialize(&display_attributes(true)),
        Err(Error::NoPixelFormatFound)
    );
    let config_queries = fake
        .calls()
        .iter()
        .filter(|call| matches!(call, FakeCall::ChooseConfig { .. }))
        .count();
    assert_eq!(config_queries, 2, "both ES 3 and ES 2 renderable types are tried");

    let fake = Arc::new(FakeEGL::new());
    fake.fail_pbuffer_creation(true);
    assert_eq!(
        new_display(&fake).initialize(&display_attributes(true)),
        Err(Error::MockSurfaceCreationFailed(WindowingApiError::BadAlloc))
    );
    assert!(!fake.calls().iter().any(FakeCall::is_create_context));

    let fake = Arc::new(FakeEGL::new());
    fake.report_es_version(GLVersion::new(1, 1));
    let mut display = new_display(&fake);
    assert_eq!(
        display.initialize(&display_attributes(true)),
        Err(Error::UnsupportedESVersion(GLVersion::new(1, 1)))
    );
    assert_eq!(fake.live_contexts(), 0);
    assert_eq!(fake.live_surfaces(), 0);
    assert!(!fake.is_initialized());
    assert!(!display.is_initialized());

    let fake = Arc::new(FakeEGL::new());
    let unknown_platform = attributes(&[(EGL_PLATFORM_ANGLE_TYPE_ANGLE, 0x1234)]);
    assert_eq!(
        new_display(&fake).initialize(&unknown_platform),
        Err(Error::NoRenderableType)
    );
    assert!(fake.calls().is_empty());

    // ES 258.0 must not wrap around to a 2.0 request.
    let fake = Arc::new(FakeEGL::new());
    let wrapping_version = attributes(&[
        (EGL_PLATFORM_ANGLE_MAX_VERSION_MAJOR_ANGLE, 258),
        (EGL_PLATFORM_ANGLE_MAX_VERSION_MINOR_ANGLE, 0),
    ]);
    assert_eq!(
        new_display(&fake).initialize(&wrapping_version),
        Err(Error::DisplayInitializationFailed(WindowingApiError::BadAttribute))
    );
    assert!(fake.calls().is_empty());

    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    assert_eq!(
        display.initialize(&display_attributes(true)),
        Err(Error::AlreadyInitialized)
    );
}

#[test]
fn test_desktop_gl_platform_type() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_configs(vec![FakeConfig::new(1, [8, 8, 8, 8], 24, 8)
        .with(egl::RENDERABLE_TYPE, egl::OPENGL_BIT as EGLint)]);
    let mut display = new_display(&fake);
    let mut requested = display_attributes(true);
    requested.insert(
        EGL_PLATFORM_ANGLE_TYPE_ANGLE as EGLint,
        EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE as EGLAttrib,
    );
    display.initialize(&requested).unwrap();

    let calls = fake.calls();
    assert_eq!(calls[1], FakeCall::BindApi(egl::OPENGL_API));
    match calls[2] {
        FakeCall::ChooseConfig { ref attributes, .. } => assert_eq!(
            attribute_value(attributes, egl::RENDERABLE_TYPE),
            Some(egl::OPENGL_BIT as EGLint)
        ),
        ref other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn test_generate_configs_filters_and_is_idempotent() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);

    let configs = display.generate_configs().unwrap();
    assert_eq!(display.generate_configs().unwrap(), configs);
    assert_eq!(configs.len(), 1, "only the RGBA8/D24S8 config survives the format filter");

    let config = configs.get(1).unwrap();
    assert_eq!(config.config_id, 1);
    assert_eq!(config.native_config_id, 1);
    assert_eq!(config.render_target_format, RenderTargetFormat::RGBA8);
    assert_eq!(config.depth_stencil_format, DepthStencilFormat::D24S8);
    assert_eq!(config.surface_type, (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint);
    assert_eq!(config.render_target_format.to_gl_enum(), glow::RGBA8);
}

#[test]
fn test_no_config_contexts_widen_the_config_filter() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_KHR_no_config_context");
    let mut display = initialized_display(&fake, true);

    assert_eq!(display.egl_config(), Some(EGL_NO_CONFIG_KHR));
    for call in fake.calls() {
        match call {
            FakeCall::CreateContext { config, .. } => assert_eq!(config, 0),
            FakeCall::CreatePbufferSurface { config, .. } => assert_ne!(config, 0),
            _ => {}
        }
    }

    let configs = display.generate_configs().unwrap();
    let summary: Vec<_> = configs
        .iter()
        .map(|config| {
            (
                config.config_id,
                config.native_config_id,
                config.render_target_format,
                config.depth_stencil_format,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, 1, RenderTargetFormat::RGBA8, DepthStencilFormat::D24S8),
            (2, 2, RenderTargetFormat::RGB8, DepthStencilFormat::D24S8),
            (3, 4, RenderTargetFormat::RGB565, DepthStencilFormat::D16),
        ]
    );
}

#[test]
fn test_surfaces() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    let size = attributes(&[(egl::WIDTH, 32), (egl::HEIGHT, 16), (egl::RED_SIZE, 8)]);

    assert_eq!(
        display.create_pbuffer_surface(1, &size).err(),
        Some(Error::UnknownConfig),
        "config IDs are only known once configs are generated"
    );

    display.generate_configs().unwrap();
    fake.take_calls();
    let mut pbuffer = display.create_pbuffer_surface(1, &size).unwrap();
    assert_eq!(pbuffer.size(), Some(Size2D::new(32, 16)));
    assert_eq!(pbuffer.config_id(), 1);
    let calls = fake.take_calls();
    assert_eq!(
        calls[0],
        FakeCall::ChooseConfig {
            attributes: vec![egl::CONFIG_ID as EGLint, 1, egl::NONE as EGLint],
            max_configs: Some(1),
        }
    );
    match calls[1] {
        FakeCall::CreatePbufferSurface { ref attributes, .. } => assert_eq!(
            *attributes,
            vec![egl::HEIGHT as EGLint, 16, egl::WIDTH as EGLint, 32, egl::NONE as EGLint]
        ),
        ref other => panic!("unexpected call {:?}", other),
    }

    let window = unsafe { NativeWindow::from_raw(0x42 as EGLNativeWindowType) };
    let mut window_surface = display
        .create_window_surface(1, window, &AttributeMap::new())
        .unwrap();
    assert!(window_surface.is_window());
    assert_eq!(window_surface.native_window(), Some(window));
    assert!(matches!(
        fake.calls().last(),
        Some(FakeCall::CreateWindowSurface { window: 0x42, .. })
    ));

    let null_window = unsafe { NativeWindow::from_raw(ptr::null()) };
    assert_eq!(
        display
            .create_window_surface(1, null_window, &AttributeMap::new())
            .err(),
        Some(Error::SurfaceCreationFailed(WindowingApiError::BadNativeWindow))
    );
    assert_eq!(
        display.create_pbuffer_surface(7, &size).err(),
        Some(Error::UnknownConfig)
    );

    display.destroy_surface(&mut pbuffer).unwrap();
    assert_eq!(display.destroy_surface(&mut pbuffer), Err(Error::SurfaceDestroyed));
    display.destroy_surface(&mut window_surface).unwrap();
    assert_eq!(fake.live_surfaces(), 1, "only the mock pbuffer is left");
}

#[test]
fn test_make_current_skips_redundant_native_calls() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    display.generate_configs().unwrap();
    let shared_context = display.renderer().unwrap().egl_context();
    let mock = display.mock_surface();

    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    assert_eq!(context.egl_context(), shared_context);
    let size = attributes(&[(egl::WIDTH, 16), (egl::HEIGHT, 16)]);
    let mut surface = display.create_pbuffer_surface(1, &size).unwrap();
    fake.take_calls();

    display
        .make_current(Some(&surface), Some(&surface), Some(&context))
        .unwrap();
    assert_eq!(
        make_current_calls(&fake),
        vec![FakeCall::MakeCurrent {
            surface: surface.egl_surface() as usize,
            context: shared_context as usize,
        }]
    );

    display
        .make_current(Some(&surface), Some(&surface), Some(&context))
        .unwrap();
    assert!(make_current_calls(&fake).is_empty());

    // No surface keeps the one the shared context already has.
    display.make_current(None, None, Some(&context)).unwrap();
    assert!(make_current_calls(&fake).is_empty());
    assert_eq!(display.current_native_context().surface, surface.egl_surface());

    display.make_current(None, None, None).unwrap();
    assert_eq!(
        make_current_calls(&fake),
        vec![FakeCall::MakeCurrent { surface: 0, context: 0 }]
    );
    assert_eq!(display.current_native_context(), CurrentNativeContext::default());

    // Without surfaceless support, a context bound with no surface gets the mock pbuffer.
    display.make_current(None, None, Some(&context)).unwrap();
    assert_eq!(
        make_current_calls(&fake),
        vec![FakeCall::MakeCurrent {
            surface: mock as usize,
            context: shared_context as usize,
        }]
    );

    display.make_current(None, None, None).unwrap();
    display.destroy_surface(&mut surface).unwrap();
    display.destroy_context(&mut context).unwrap();
    assert!(context.is_destroyed());
}

#[test]
fn test_failed_make_current_keeps_the_previous_binding() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    display.generate_configs().unwrap();
    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    let size = attributes(&[(egl::WIDTH, 16), (egl::HEIGHT, 16)]);
    let mut surface = display.create_pbuffer_surface(1, &size).unwrap();
    let before = display.current_native_context();

    fake.fail_next_make_current(1);
    assert_eq!(
        display.make_current(Some(&surface), Some(&surface), Some(&context)),
        Err(Error::MakeCurrentFailed(WindowingApiError::BadAccess))
    );
    assert_eq!(display.current_native_context(), before);

    display
        .make_current(Some(&surface), Some(&surface), Some(&context))
        .unwrap();
    assert_eq!(display.current_native_context().surface, surface.egl_surface());

    display.make_current(None, None, None).unwrap();
    display.destroy_surface(&mut surface).unwrap();
    display.destroy_context(&mut context).unwrap();
}

#[test]
fn test_surfaceless_driver_needs_no_mock_surface() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_KHR_surfaceless_context");
    let display = initialized_display(&fake, true);

    assert_eq!(display.mock_surface(), egl::NO_SURFACE);
    assert!(!fake
        .calls()
        .iter()
        .any(|call| matches!(call, FakeCall::CreatePbufferSurface { .. })));

    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    display.make_current(None, None, None).unwrap();
    fake.take_calls();
    display.make_current(None, None, Some(&context)).unwrap();
    assert_eq!(
        make_current_calls(&fake),
        vec![FakeCall::MakeCurrent {
            surface: 0,
            context: context.egl_context() as usize,
        }]
    );
    display.destroy_context(&mut context).unwrap();
}

#[test]
fn test_virtualized_contexts_share_the_display_renderer() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, true);
    fake.take_calls();

    let mut first = display.create_context(None, &AttributeMap::new()).unwrap();
    let mut second = display.create_context(Some(&first), &AttributeMap::new()).unwrap();
    assert!(fake.take_calls().is_empty());
    assert!(ptr::eq(first.renderer().unwrap(), display.renderer().unwrap()));
    assert!(ptr::eq(first.renderer().unwrap(), second.renderer().unwrap()));
    assert_eq!(first.egl_context(), second.egl_context());
    assert_ne!(first.id(), second.id());

    display.destroy_context(&mut first).unwrap();
    assert!(first.renderer().is_none());
    assert!(second.renderer().is_some());
    display.destroy_context(&mut second).unwrap();
    assert!(fake.take_calls().is_empty(), "the display renderer outlives its contexts");
    assert_eq!(fake.live_contexts(), 1);
    assert!(display.renderer().is_some());
}

#[test]
fn test_non_virtualized_contexts_get_their_own_renderer() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, false);
    let display_context = display.renderer().unwrap().egl_context();
    let binding = display.current_native_context();

    let purge = attributes(&[(EGL_GENERATE_RESET_ON_VIDEO_MEMORY_PURGE_NV, egl::TRUE as EGLAttrib)]);
    let mut first = display.create_context(None, &purge).unwrap();
    let mut second = display.create_context(None, &AttributeMap::new()).unwrap();
    assert!(first.generates_reset_on_video_memory_purge());
    assert!(!second.generates_reset_on_video_memory_purge());
    assert_ne!(first.egl_context(), display_context);
    assert_ne!(first.egl_context(), second.egl_context());

    fake.take_calls();
    let mut shared = display
        .create_context(Some(&first), &AttributeMap::new())
        .unwrap();
    let calls = fake.take_calls();
    for call in &calls {
        if let FakeCall::CreateContext { share_context, .. } = *call {
            assert_eq!(share_context, first.egl_context() as usize);
        }
    }
    // The new context is bound to load its functions, then the previous binding comes back.
    let rebinds: Vec<_> = calls.into_iter().filter(FakeCall::is_make_current).collect();
    assert_eq!(
        rebinds,
        vec![
            FakeCall::MakeCurrent {
                surface: display.mock_surface() as usize,
                context: shared.egl_context() as usize,
            },
            FakeCall::MakeCurrent {
                surface: binding.surface as usize,
                context: binding.context as usize,
            },
        ]
    );
    assert_eq!(display.current_native_context(), binding);
    assert_eq!(fake.live_contexts(), 4);

    let first_context = first.egl_context();
    for context in [&mut first, &mut second, &mut shared] {
        display.destroy_context(context).unwrap();
    }
    assert!(fake.calls().contains(&FakeCall::DestroyContext(first_context as usize)));
    assert_eq!(fake.live_contexts(), 1);
}

#[test]
fn test_failed_restore_after_context_creation_leaves_nothing_bound() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, false);
    display.generate_configs().unwrap();
    let size = attributes(&[(egl::WIDTH, 16), (egl::HEIGHT, 16)]);
    let mut surface = display.create_pbuffer_surface(1, &size).unwrap();
    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    display
        .make_current(Some(&surface), Some(&surface), Some(&context))
        .unwrap();
    // The bound surface goes away underneath the binding record.
    display.destroy_surface(&mut surface).unwrap();
    let live_contexts = fake.live_contexts();
    fake.take_calls();

    assert_eq!(
        display.create_context(None, &AttributeMap::new()).err(),
        Some(Error::MakeCurrentFailed(WindowingApiError::BadSurface))
    );
    assert_eq!(display.current_native_context(), CurrentNativeContext::default());
    assert_eq!(fake.bound_on_this_thread(), (egl::NO_SURFACE, egl::NO_CONTEXT));
    assert_eq!(fake.live_contexts(), live_contexts);
    let calls = fake.take_calls();
    assert!(calls.contains(&FakeCall::MakeCurrent { surface: 0, context: 0 }));
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, FakeCall::DestroyContext(_)))
            .count(),
        1
    );

    // The next request reaches the driver instead of trusting a stale record.
    let mut surface = display.create_pbuffer_surface(1, &size).unwrap();
    display
        .make_current(Some(&surface), Some(&surface), Some(&context))
        .unwrap();
    assert_eq!(
        make_current_calls(&fake),
        vec![FakeCall::MakeCurrent {
            surface: surface.egl_surface() as usize,
            context: context.egl_context() as usize,
        }]
    );
    display.make_current(None, None, None).unwrap();
    display.destroy_surface(&mut surface).unwrap();
    display.destroy_context(&mut context).unwrap();
}

#[test]
fn test_destroying_a_context_clears_it_on_every_thread() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_KHR_surfaceless_context");
    let display = initialized_display(&fake, false);
    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    let egl_context = context.egl_context();
    let main_binding = display.current_native_context();

    let other_thread = thread::scope(|scope| {
        scope
            .spawn(|| {
                display.make_current(None, None, Some(&context)).unwrap();
                thread::current().id()
            })
            .join()
            .unwrap()
    });
    assert_eq!(
        display.current_native_context_on(other_thread),
        Some(CurrentNativeContext {
            surface: egl::NO_SURFACE,
            context: egl_context,
            is_external_context: false,
        })
    );

    display.destroy_context(&mut context).unwrap();

    assert_eq!(
        display.current_native_context_on(other_thread),
        Some(CurrentNativeContext::default())
    );
    assert_eq!(display.current_native_context(), main_binding);
    assert!(!fake.is_live_context(egl_context));
}

#[test]
fn test_destroy_native_context_leaves_other_bindings_alone() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, true);
    let binding = display.current_native_context();

    let stray = fake.create_context(
        display.egl_config().unwrap(),
        egl::NO_CONTEXT,
        &[egl::NONE as EGLint],
    );
    assert!(fake.is_live_context(stray));
    display.destroy_native_context(stray);
    assert!(!fake.is_live_context(stray));
    assert_eq!(display.current_native_context(), binding);
}

#[test]
fn test_external_context_adopt_and_release() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, true);
    let external = attributes(&[(EGL_EXTERNAL_CONTEXT_ANGLE, egl::TRUE as EGLAttrib)]);

    thread::scope(|scope| {
        scope
            .spawn(|| {
                assert_eq!(
                    display.create_context(None, &external).err(),
                    Some(Error::NoCurrentContext)
                );

                let egl_context = fake.make_external_context_current();
                fake.take_calls();
                let mut context = display.create_context(None, &external).unwrap();
                assert_eq!(
                    fake.take_calls(),
                    vec![FakeCall::GetCurrentContext, FakeCall::LoadGLFunctions]
                );
                assert!(context.is_external());
                assert_eq!(context.egl_context(), egl_context);
                assert_eq!(
                    context.renderer().unwrap().attributes(),
                    &version_attributes(2, 0, false)[..]
                );

                let size = attributes(&[(egl::WIDTH, 640), (egl::HEIGHT, 480)]);
                let mut surface = display
                    .create_pbuffer_from_client_buffer(
                        0,
                        EGL_EXTERNAL_SURFACE_ANGLE,
                        ptr::null_mut(),
                        &size,
                    )
                    .unwrap();
                assert!(surface.is_external());
                assert_eq!(surface.size(), Some(Size2D::new(640, 480)));
                assert_eq!(surface.swap_behavior(), Some(egl::BUFFER_DESTROYED as EGLint));

                display
                    .make_current(Some(&surface), Some(&surface), Some(&context))
                    .unwrap();
                assert_eq!(
                    display.current_native_context(),
                    CurrentNativeContext {
                        surface: egl::NO_SURFACE,
                        context: egl_context,
                        is_external_context: true,
                    }
                );

                display
                    .make_current(Some(&surface), Some(&surface), Some(&context))
                    .unwrap();
                display.make_current(None, None, None).unwrap();
                assert_eq!(display.current_native_context(), CurrentNativeContext::default());
                assert!(make_current_calls(&fake).is_empty());

                display.destroy_context(&mut context).unwrap();
                display.destroy_surface(&mut surface).unwrap();
                assert!(fake.is_live_context(egl_context), "the embedder still owns it");
                fake.release_external_context(egl_context);
            })
            .join()
            .unwrap()
    });
}

#[test]
fn test_client_buffer_validation() {
    let fake = Arc::new(FakeEGL::new());
    let display = initialized_display(&fake, true);
    let empty = AttributeMap::new();
    let mut buffer = 0u8;
    let buffer = &mut buffer as *mut u8 as EGLClientBuffer;

    assert_eq!(
        display.validate_client_buffer(0, EGL_EXTERNAL_SURFACE_ANGLE, ptr::null_mut(), &empty),
        Ok(())
    );
    assert_eq!(
        display.validate_client_buffer(0, EGL_EXTERNAL_SURFACE_ANGLE, buffer, &empty),
        Err(Error::InvalidClientBuffer)
    );
    assert_eq!(
        display
            .create_pbuffer_from_client_buffer(0, egl::OPENVG_IMAGE, ptr::null_mut(), &empty)
            .err(),
        Some(Error::UnsupportedClientBuffer)
    );
}

#[test]
fn test_worker_context() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_KHR_surfaceless_context");
    let display = initialized_display(&fake, true);
    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    let worker_attributes = AttributeMap::from_int_list(context.renderer().unwrap().attributes());

    fake.take_calls();
    let worker = display
        .create_worker_context(Some(&context), &worker_attributes)
        .unwrap();
    assert_eq!(
        fake.take_calls(),
        vec![FakeCall::CreateContext {
            config: display.egl_config().unwrap() as usize,
            share_context: context.egl_context() as usize,
            attributes: worker_attributes.to_int_vector(),
        }]
    );
    let worker_context = worker.egl_context();
    let worker_address = worker_context as usize;

    thread::scope(|scope| {
        let (display, fake) = (&display, &fake);
        scope.spawn(move || {
            worker.make_current().unwrap();
            let (surface, context) = fake.bound_on_this_thread();
            assert_eq!((surface as usize, context as usize), (0, worker_address));
            assert_eq!(display.current_native_context(), CurrentNativeContext::default());
            worker.unmake_current().unwrap();
        });
    });
    assert!(fake.calls().contains(&FakeCall::DestroyContext(worker_context as usize)));
    assert!(!fake.is_live_context(worker_context));

    fake.reject_contexts(|_| true);
    assert_eq!(
        display.create_worker_context(None, &worker_attributes).err(),
        Some(Error::ContextCreationFailed(WindowingApiError::BadMatch))
    );
    display.destroy_context(&mut context).unwrap();
}

#[test]
fn test_unimplemented_and_fixed_operations() {
    let fake = Arc::new(FakeEGL::new());
    let uninitialized = new_display(&fake);
    assert_eq!(
        uninitialized.create_context(None, &AttributeMap::new()).err(),
        Some(Error::NotInitialized)
    );
    assert_eq!(uninitialized.max_supported_es_version(), Err(Error::NotInitialized));
    assert_eq!(uninitialized.generate_extensions(), DisplayExtensions::empty());
    drop(uninitialized);
    assert!(fake.calls().is_empty());

    let mut display = initialized_display(&fake, true);
    let mut context = display.create_context(None, &AttributeMap::new()).unwrap();
    assert_eq!(
        display
            .create_pixmap_surface(1, ptr::null(), &AttributeMap::new())
            .err(),
        Some(Error::Unimplemented)
    );
    assert_eq!(display.wait_client(&context), Err(Error::Unimplemented));
    assert_eq!(
        display.wait_native(&context, egl::CORE_NATIVE_ENGINE as EGLint),
        Err(Error::Unimplemented)
    );
    assert_eq!(display.make_current_surfaceless(&context), Ok(()));
    assert!(!display.test_device_lost());
    assert!(display.is_valid_native_window(&unsafe { NativeWindow::from_raw(ptr::null()) }));
    assert!(display.generate_caps().texture_npot);

    display.destroy_context(&mut context).unwrap();
    assert_eq!(display.restore_lost_device(), Err(Error::Unimplemented));
}

#[test]
fn test_generated_extensions_follow_driver_and_virtualization() {
    let fake = Arc::new(FakeEGL::new());
    fake.set_extensions("EGL_KHR_image_base EGL_EXT_gl_colorspace_scrgb");
    let virtualized = initialized_display(&fake, true).generate_extensions();
    assert!(virtualized.contains(
        DisplayExtensions::SURFACELESS_CONTEXT
            | DisplayExtensions::EXTERNAL_CONTEXT_AND_SURFACE
            | DisplayExtensions::IMAGE_BASE
            | DisplayExtensions::FENCE_SYNC
    ));
    assert!(!virtualized.contains(DisplayExtensions::POST_SUB_BUFFER));
    assert!(!virtualized.contains(DisplayExtensions::GL_COLORSPACE_SCRGB));

    let fake = Arc::new(FakeEGL::new());
    let unvirtualized = initialized_display(&fake, false).generate_extensions();
    assert!(!unvirtualized.contains(DisplayExtensions::SURFACELESS_CONTEXT));
}

#[test]
fn test_terminate_releases_everything() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    let mock = display.mock_surface();
    let shared_context = display.renderer().unwrap().egl_context();
    fake.take_calls();

    display.terminate();
    assert_eq!(
        fake.take_calls(),
        vec![
            FakeCall::MakeCurrent { surface: 0, context: 0 },
            FakeCall::DestroySurface(mock as usize),
            FakeCall::DestroyContext(shared_context as usize),
            FakeCall::Terminate,
        ]
    );
    assert_eq!(fake.live_contexts(), 0);
    assert_eq!(fake.live_surfaces(), 0);
    assert!(!display.is_initialized());
    assert_eq!(
        display.create_context(None, &AttributeMap::new()).err(),
        Some(Error::NotInitialized)
    );

    display.terminate();
    assert!(fake.take_calls().is_empty());

    display.initialize(&display_attributes(true)).unwrap();
    assert!(display.is_initialized());
}

#[test]
#[should_panic(expected = "Contexts must be destroyed")]
fn test_terminating_with_live_contexts_panics() {
    let fake = Arc::new(FakeEGL::new());
    let mut display = initialized_display(&fake, true);
    let context = display.create_context(None, &AttributeMap::new()).unwrap();
    display.terminate();
    drop(context);
}
