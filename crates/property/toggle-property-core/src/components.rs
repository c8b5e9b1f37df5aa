//! Built-in UI-like components and their method registrations.
//!
//! These stand in for the host engine's widgets so bindings have concrete
//! targets. Methods follow the `set_<field>` convention.

use toggle_api_core::{AnimationCurve, Color, ColorBlock, EnumValue, Gradient, LayerMask, ObjectId};

use crate::baked::BakedPropertyTable;
use crate::error::InvokeError;
use crate::impl_component;
use crate::reflect::TypeRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub color: Color,
    pub font_size: i32,
    pub alignment: EnumValue,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Color::BLACK,
            font_size: 14,
            alignment: EnumValue(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub color: Color,
    pub sprite: Option<ObjectId>,
    pub raycast_target: bool,
    pub fill_amount: f32,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            sprite: None,
            raycast_target: true,
            fill_amount: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectTransform {
    pub anchored_position: [f32; 2],
    pub size_delta: [f32; 2],
    pub local_scale: [f32; 3],
}

impl Default for RectTransform {
    fn default() -> Self {
        Self {
            anchored_position: [0.0; 2],
            size_delta: [100.0, 100.0],
            local_scale: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasGroup {
    pub alpha: f32,
    pub interactable: bool,
}

impl Default for CanvasGroup {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            interactable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Button {
    pub colors: ColorBlock,
    pub interactable: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineRenderer {
    pub color_gradient: Gradient,
    pub width_curve: AnimationCurve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub culling_mask: LayerMask,
    pub background_color: Color,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            culling_mask: LayerMask(u32::MAX),
            background_color: Color::BLACK,
        }
    }
}

impl_component!(Text, "Text");
impl_component!(Image, "Image");
impl_component!(RectTransform, "RectTransform");
impl_component!(CanvasGroup, "CanvasGroup");
impl_component!(Button, "Button");
impl_component!(LineRenderer, "LineRenderer");
impl_component!(Camera, "Camera");

/// Register the built-in components, their methods and the argument type
/// names they use.
pub fn register_builtin_components(reg: &mut TypeRegistry) {
    reg.register_enum("TextAnchor");
    reg.register_object_type("Sprite");
    reg.register_opaque_type("Font");

    reg.register_component::<Text>("Text")
        .method("set_text", |c: &mut Text, v: String| c.text = v)
        .method("set_color", |c: &mut Text, v: Color| c.color = v)
        .try_method("set_font_size", |c: &mut Text, v: i32| {
            if v < 0 {
                return Err(InvokeError::new(format!("font size {v} is negative")));
            }
            c.font_size = v;
            Ok(())
        })
        .method_as("set_alignment", "TextAnchor", |c: &mut Text, v: EnumValue| {
            c.alignment = v
        });

    reg.register_component::<Image>("Image")
        .method("set_color", |c: &mut Image, v: Color| c.color = v)
        .method_as("set_sprite", "Sprite", |c: &mut Image, v: Option<ObjectId>| {
            c.sprite = v
        })
        .method("set_raycast_target", |c: &mut Image, v: bool| {
            c.raycast_target = v
        })
        .method("set_fill_amount", |c: &mut Image, v: f32| {
            c.fill_amount = v.clamp(0.0, 1.0)
        });

    reg.register_component::<RectTransform>("RectTransform")
        .method("set_anchored_position", |c: &mut RectTransform, v: [f32; 2]| {
            c.anchored_position = v
        })
        .method("set_size_delta", |c: &mut RectTransform, v: [f32; 2]| {
            c.size_delta = v
        })
        .method("set_local_scale", |c: &mut RectTransform, v: [f32; 3]| {
            c.local_scale = v
        });

    reg.register_component::<CanvasGroup>("CanvasGroup")
        .method("set_alpha", |c: &mut CanvasGroup, v: f32| c.alpha = v)
        .method("set_interactable", |c: &mut CanvasGroup, v: bool| {
            c.interactable = v
        });

    reg.register_component::<Button>("Button")
        .method("set_colors", |c: &mut Button, v: ColorBlock| c.colors = v)
        .method("set_interactable", |c: &mut Button, v: bool| c.interactable = v);

    reg.register_component::<LineRenderer>("LineRenderer")
        .method("set_color_gradient", |c: &mut LineRenderer, v: Gradient| {
            c.color_gradient = v
        })
        .method("set_width_curve", |c: &mut LineRenderer, v: AnimationCurve| {
            c.width_curve = v
        });

    reg.register_component::<Camera>("Camera")
        .method("set_culling_mask", |c: &mut Camera, v: LayerMask| {
            c.culling_mask = v
        })
        .method("set_background_color", |c: &mut Camera, v: Color| {
            c.background_color = v
        });
}

/// Direct-call entries for the hottest built-in setters.
pub fn register_builtin_bakes(table: &mut BakedPropertyTable) {
    table
        .bake("Text", "set_text", |c: &mut Text, v: String| {
            c.text = v;
            Ok(())
        })
        .bake("Text", "set_color", |c: &mut Text, v: Color| {
            c.color = v;
            Ok(())
        })
        .bake("Image", "set_color", |c: &mut Image, v: Color| {
            c.color = v;
            Ok(())
        })
        .bake("CanvasGroup", "set_alpha", |c: &mut CanvasGroup, v: f32| {
            c.alpha = v;
            Ok(())
        })
        .bake(
            "RectTransform",
            "set_anchored_position",
            |c: &mut RectTransform, v: [f32; 2]| {
                c.anchored_position = v;
                Ok(())
            },
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bake_has_a_reflective_twin() {
        let mut reg = TypeRegistry::new();
        register_builtin_components(&mut reg);
        let mut table = BakedPropertyTable::new();
        register_builtin_bakes(&mut table);
        for key in table.keys() {
            let id = toggle_api_core::MethodId::parse(key).unwrap();
            let info = reg.resolve_type(id.target_type()).unwrap();
            assert!(
                info.has_method(id.method_name(), id.argument_type()),
                "{key} is baked but not reflected"
            );
        }
    }

    #[test]
    fn builtin_argument_names_resolve() {
        let mut reg = TypeRegistry::new();
        register_builtin_components(&mut reg);
        assert!(reg.resolve_kind("TextAnchor").is_ok());
        assert!(reg.resolve_kind("Sprite").is_ok());
        assert!(reg.resolve_kind("Font").is_err());
        assert_eq!(
            reg.type_names(),
            vec![
                "Button",
                "Camera",
                "CanvasGroup",
                "Image",
                "LineRenderer",
                "RectTransform",
                "Text"
            ]
        );
    }
}
