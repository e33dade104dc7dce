//! Time-of-day and weather look of the forest.
//!
//! [`scene_params`] is a pure function of the two modes, so applying a mode
//! twice, or applying time and weather in either order, lands on the same
//! parameters. Colours are `0xRRGGBB`.

use forest_types::{TimeMode, WeatherMode};
use serde::Serialize;

/// Three-stop sky gradient plus exponential fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkyParams {
    /// Zenith colour.
    pub top: u32,
    /// Horizon colour.
    pub mid: u32,
    /// Colour below the horizon.
    pub bottom: u32,
    /// Fog and clear colour.
    pub fog_color: u32,
    /// Exponential fog density.
    pub fog_density: f32,
}

/// Colour and intensity of one light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightParams {
    /// Light colour.
    pub color: u32,
    /// Light intensity.
    pub intensity: f32,
}

/// Colours of the static landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LandscapeParams {
    /// Forest floor.
    pub ground: u32,
    /// Ground beyond the play area.
    pub far_ground: u32,
    /// Mountain ring.
    pub mountains: u32,
    /// Distant tree line.
    pub distant_trees: u32,
    /// River surface.
    pub river: u32,
}

/// Everything the renderer needs to draw the current modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneParams {
    /// Sky and fog.
    pub sky: SkyParams,
    /// Hemisphere ambient light.
    pub ambient: LightParams,
    /// Directional sun or moon light.
    pub sun: LightParams,
    /// Landscape colours.
    pub landscape: LandscapeParams,
    /// Tone-mapping exposure.
    pub exposure: f32,
    /// Whether the sun disc is drawn.
    pub sun_visible: bool,
    /// Moon disc opacity.
    pub moon_opacity: f32,
    /// Star field opacity.
    pub star_opacity: f32,
    /// Firefly opacity.
    pub firefly_opacity: f32,
    /// Cloud tint.
    pub cloud_color: u32,
    /// Cloud opacity.
    pub cloud_opacity: f32,
    /// Rain streak opacity, 0 when not raining.
    pub rain_opacity: f32,
    /// Snowflake opacity, 0 when not snowing.
    pub snow_opacity: f32,
}

/// Compute the look for a time and weather combination.
#[allow(clippy::too_many_lines)]
pub fn scene_params(time: TimeMode, weather: WeatherMode) -> SceneParams {
    let night = time == TimeMode::Night;

    let mut params = if night {
        SceneParams {
            sky: sky(0x0002_051a, 0x0006_0c2a, 0x000a_1a10, 0x0003_0811, 0.006),
            ambient: LightParams {
                color: 0x001a_2244,
                intensity: 0.3,
            },
            sun: LightParams {
                color: 0x0088_99cc,
                intensity: 0.35,
            },
            landscape: LandscapeParams {
                ground: SUNNY_GROUND,
                far_ground: 0x0016_2027,
                mountains: 0x002c_3a4a,
                distant_trees: 0x001a_2f29,
                river: 0x000f_2244,
            },
            exposure: 0.65,
            sun_visible: false,
            moon_opacity: 0.96,
            star_opacity: 0.88,
            firefly_opacity: 0.9,
            cloud_color: 0x003a_4c70,
            cloud_opacity: 0.55,
            rain_opacity: 0.0,
            snow_opacity: 0.0,
        }
    } else {
        SceneParams {
            sky: sky(0x001a_6dd4, 0x0087_ceeb, 0x00d4_e8c2, 0x0087_ceeb, 0.0025),
            ambient: LightParams {
                color: 0x00ff_f4e0,
                intensity: 0.9,
            },
            sun: LightParams {
                color: 0x00ff_f6d0,
                intensity: 2.8,
            },
            landscape: LandscapeParams {
                ground: SUNNY_GROUND,
                far_ground: 0x0058_7554,
                mountains: 0x008d_a5b8,
                distant_trees: 0x003e_6645,
                river: 0x001a_88dd,
            },
            exposure: 1.15,
            sun_visible: true,
            moon_opacity: 0.0,
            star_opacity: 0.0,
            firefly_opacity: 0.0,
            cloud_color: 0x00ff_ffff,
            cloud_opacity: 0.88,
            rain_opacity: 0.0,
            snow_opacity: 0.0,
        }
    };

    match (weather, night) {
        (WeatherMode::Sunny, _) => {}
        (WeatherMode::Rain, false) => {
            params.rain_opacity = 0.52;
            params.sky = sky(0x004a_6a80, 0x006a_8fa8, 0x008a_aa9a, 0x006a_8fa8, 0.007);
            params.landscape.far_ground = 0x004f_6460;
            params.landscape.mountains = 0x0070_8596;
            params.landscape.distant_trees = 0x003a_5747;
        }
        (WeatherMode::Rain, true) => {
            params.rain_opacity = 0.52;
            params.sky = sky(0x0003_0810, 0x0008_0e1a, 0x0009_0e10, 0x0006_0c14, 0.009);
            params.landscape.far_ground = 0x0011_1921;
            params.landscape.mountains = 0x001f_2c39;
            params.landscape.distant_trees = 0x0015_2622;
        }
        (WeatherMode::Snow, false) => {
            params.snow_opacity = 0.7;
            params.sky = sky(0x008a_a8c4, 0x00c4_d8e8, 0x00d8_e8e8, 0x00c4_d8e8, 0.005);
            params.landscape.ground = 0x00d0_e0d8;
            params.landscape.far_ground = 0x00b7_c4c1;
            params.landscape.mountains = 0x00cb_d7e2;
            params.landscape.distant_trees = 0x007d_95a6;
        }
        (WeatherMode::Snow, true) => {
            params.snow_opacity = 0.7;
            params.sky = sky(0x0008_0c18, 0x000e_1528, 0x0010_1820, 0x000c_1220, 0.007);
            params.landscape.ground = 0x0060_80a0;
            params.landscape.far_ground = 0x0045_5567;
            params.landscape.mountains = 0x0074_879d;
            params.landscape.distant_trees = 0x0046_5f6f;
        }
    }

    params
}

const SUNNY_GROUND: u32 = 0x004a_7c3f;

const fn sky(top: u32, mid: u32, bottom: u32, fog_color: u32, fog_density: f32) -> SkyParams {
    SkyParams {
        top,
        mid,
        bottom,
        fog_color,
        fog_density,
    }
}

/// Currently selected modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentState {
    time: TimeMode,
    weather: WeatherMode,
}

impl EnvironmentState {
    /// Selected time of day.
    pub const fn time(&self) -> TimeMode {
        self.time
    }

    /// Selected weather.
    pub const fn weather(&self) -> WeatherMode {
        self.weather
    }

    /// Select a time of day and return the resulting look.
    pub fn apply_time(&mut self, time: TimeMode) -> SceneParams {
        self.time = time;
        self.params()
    }

    /// Select a weather and return the resulting look.
    pub fn apply_weather(&mut self, weather: WeatherMode) -> SceneParams {
        self.weather = weather;
        self.params()
    }

    /// Look for the current modes.
    pub fn params(&self) -> SceneParams {
        scene_params(self.time, self.weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_night_twice_is_idempotent() {
        let mut env = EnvironmentState::default();
        let once = env.apply_time(TimeMode::Night);
        let twice = env.apply_time(TimeMode::Night);
        assert_eq!(once, twice);
    }

    #[test]
    fn mode_order_does_not_matter() {
        let mut a = EnvironmentState::default();
        a.apply_time(TimeMode::Night);
        let a = a.apply_weather(WeatherMode::Snow);

        let mut b = EnvironmentState::default();
        b.apply_weather(WeatherMode::Snow);
        let b = b.apply_time(TimeMode::Night);

        assert_eq!(a, b);
        assert_eq!(a.landscape.ground, 0x0060_80a0);
    }

    #[test]
    fn clearing_weather_restores_the_plain_time_look() {
        let mut env = EnvironmentState::default();
        let plain = env.apply_time(TimeMode::Morning);
        env.apply_weather(WeatherMode::Rain);
        assert_eq!(env.apply_weather(WeatherMode::Sunny), plain);
    }

    #[test]
    fn precipitation_is_exclusive() {
        for time in [TimeMode::Morning, TimeMode::Night] {
            let rain = scene_params(time, WeatherMode::Rain);
            assert!(rain.rain_opacity > 0.0 && rain.snow_opacity <= 0.0);
            let snow = scene_params(time, WeatherMode::Snow);
            assert!(snow.snow_opacity > 0.0 && snow.rain_opacity <= 0.0);
        }
    }

    #[test]
    fn night_lights_the_sky_features() {
        let night = scene_params(TimeMode::Night, WeatherMode::Sunny);
        assert!(!night.sun_visible);
        assert!(night.star_opacity > 0.8 && night.firefly_opacity > 0.8);
        let day = scene_params(TimeMode::Morning, WeatherMode::Sunny);
        assert!(day.sun_visible);
        assert_eq!(day.sky.fog_color, 0x0087_ceeb);
    }
}
