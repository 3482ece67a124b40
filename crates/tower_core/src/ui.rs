//! Score display and replay control.
//!
//! Both bindings are optional at runtime: if a query comes back empty the
//! feature silently degrades instead of failing the game.

use bevy::prelude::*;

use crate::messages::ReplayRequested;
use crate::session::{GamePhase, GameSession};

#[derive(Component)]
pub struct ScoreText;

#[derive(Component)]
pub struct ReplayButton;

pub fn setup_ui(mut commands: Commands) {
    commands.spawn((
        Text::new("Score: 0"),
        TextFont {
            font_size: 28.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        ScoreText,
    ));

    commands
        .spawn((
            Button,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(50.0),
                top: Val::Percent(60.0),
                width: Val::Px(180.0),
                height: Val::Px(56.0),
                margin: UiRect {
                    left: Val::Px(-90.0),
                    ..default()
                },
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgb(0.16, 0.35, 0.18)),
            Visibility::Hidden,
            ReplayButton,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Replay"),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

pub fn update_score_text(
    session: Res<GameSession>,
    mut texts: Query<&mut Text, With<ScoreText>>,
) {
    if !session.is_changed() {
        return;
    }
    let Ok(mut text) = texts.single_mut() else {
        return;
    };
    text.0 = format!("Score: {}", session.score);
}

/// The replay control is visible exactly while the game-over screen is up.
pub fn update_replay_visibility(
    session: Res<GameSession>,
    mut buttons: Query<&mut Visibility, With<ReplayButton>>,
) {
    let Ok(mut visibility) = buttons.single_mut() else {
        return;
    };
    let desired = if session.phase == GamePhase::GameOver {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    if *visibility != desired {
        *visibility = desired;
    }
}

pub fn replay_button_clicks(
    interactions: Query<&Interaction, (Changed<Interaction>, With<ReplayButton>)>,
    mut replay: MessageWriter<ReplayRequested>,
) {
    for interaction in interactions.iter() {
        if *interaction == Interaction::Pressed {
            replay.write(ReplayRequested);
        }
    }
}
